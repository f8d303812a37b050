mod common;

use common::*;
use chrono::NaiveDate;
use sales_etl::{
    Dimension, ExportFormat, PipelineConfig, PipelineError, clean_table, load_directory,
    run_pipeline, summarize,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn config(raw_dir: &Path, out_dir: &Path, formats: Vec<ExportFormat>) -> PipelineConfig {
    PipelineConfig {
        raw_dir: raw_dir.to_path_buf(),
        out_dir: out_dir.to_path_buf(),
        formats,
        ..PipelineConfig::default()
    }
}

#[test]
fn minimal_fixture_produces_exact_group_sums() {
    let raw = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    seed_raw_dir(raw.path());

    let report = run_pipeline(&config(raw.path(), out.path(), vec![ExportFormat::Csv])).unwrap();

    assert_eq!(report.loaded_files.len(), 2);
    assert_eq!(report.skipped_files.len(), 1);
    assert_eq!(report.clean_rows, 3);
    assert_eq!(report.cleaning.duplicates_removed, 1);
    assert_eq!(report.cleaning.dropped_rows, 1);
    assert!((report.total_revenue - 1550.0).abs() < 1e-9);

    assert_eq!(
        read(out.path().join("monthly_sales.csv")),
        "month,revenue,orders,units,avg_order_value\n\
         2025-01,1150.00,2,3,575.00\n\
         2025-02,400.00,1,1,400.00\n"
    );
    assert_eq!(
        read(out.path().join("regional_sales.csv")),
        "region,revenue,orders,units,avg_order_value\n\
         North,1000.00,1,2,1000.00\n\
         South,550.00,2,2,275.00\n"
    );
    assert_eq!(
        read(out.path().join("product_sales.csv")),
        "product,revenue,orders,units,avg_order_value\n\
         Laptop,1400.00,2,3,700.00\n\
         Phone,150.00,1,1,150.00\n"
    );
}

#[test]
fn writes_every_artifact() {
    let raw = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    seed_raw_dir(raw.path());

    let formats = vec![ExportFormat::Csv, ExportFormat::Json, ExportFormat::Parquet];
    let report = run_pipeline(&config(raw.path(), out.path(), formats)).unwrap();

    for name in [
        "monthly_sales.csv",
        "regional_sales.csv",
        "product_sales.csv",
        "monthly_sales.json",
        "regional_sales.parquet",
        "monthly_trend.png",
        "regional_sales.png",
        "product_sales.png",
        "summary_report.pdf",
    ] {
        let path = out.path().join(name);
        assert!(path.exists(), "missing {}", name);
        assert!(report.artifacts.contains(&path), "not reported: {}", name);
    }
    assert_eq!(report.artifacts.len(), 3 * 3 + 3 + 1);
}

#[test]
fn empty_input_fails_before_creating_output() {
    let raw = TempDir::new().unwrap();
    let parent = TempDir::new().unwrap();
    let out_dir = parent.path().join("reports");
    write_file(raw.path(), "notes.txt", "nothing here");

    let err = run_pipeline(&config(raw.path(), &out_dir, vec![ExportFormat::Csv])).unwrap_err();

    assert!(matches!(err, PipelineError::NoValidInput(_)));
    assert!(!out_dir.exists());
}

#[test]
fn missing_raw_dir_is_reported() {
    let parent = TempDir::new().unwrap();
    let raw_dir = parent.path().join("does-not-exist");
    let out_dir = parent.path().join("reports");

    let err = run_pipeline(&config(&raw_dir, &out_dir, vec![ExportFormat::Csv])).unwrap_err();

    assert!(matches!(err, PipelineError::InputDirMissing(_)));
    assert!(!out_dir.exists());
}

#[test]
fn reruns_produce_identical_tables() {
    let raw = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_file(raw.path(), "sales.csv", &synthetic_csv(120));
    let cfg = config(raw.path(), out.path(), vec![ExportFormat::Csv, ExportFormat::Json]);

    run_pipeline(&cfg).unwrap();
    let first: Vec<Vec<u8>> = ["monthly_sales.csv", "regional_sales.csv", "product_sales.json"]
        .iter()
        .map(|name| fs::read(out.path().join(name)).unwrap())
        .collect();

    run_pipeline(&cfg).unwrap();
    let second: Vec<Vec<u8>> = ["monthly_sales.csv", "regional_sales.csv", "product_sales.json"]
        .iter()
        .map(|name| fs::read(out.path().join(name)).unwrap())
        .collect();

    assert_eq!(first, second);
}

#[test]
fn every_summary_conserves_total_revenue() {
    let raw = TempDir::new().unwrap();
    write_file(raw.path(), "sales.csv", &synthetic_csv(500));

    let table = load_directory(raw.path(), false).unwrap();
    let (sales, cleaning) = clean_table(&table);
    assert_eq!(cleaning.input_rows, 500);
    assert_eq!(sales.len(), 500);

    let summaries = summarize(&sales);
    let total = sales.total_revenue();
    for summary in summaries.iter() {
        assert!(
            (summary.total_revenue() - total).abs() < 1e-6 * total.max(1.0),
            "{:?} drifted",
            summary.dimension
        );
        let orders: u64 = summary.rows.iter().map(|r| r.orders).sum();
        assert_eq!(orders, 500);
    }
    assert_eq!(summaries.monthly.rows.len(), 6);
    assert_eq!(summaries.regional.rows.len(), 4);
    assert_eq!(summaries.product.dimension, Dimension::Product);
}

#[test]
fn same_rows_in_several_formats_collapse_to_one_set() {
    let raw = TempDir::new().unwrap();
    write_file(raw.path(), "a.csv", MINIMAL_CSV);
    write_file(raw.path(), "b.csv", MINIMAL_CSV);

    let table = load_directory(raw.path(), false).unwrap();
    assert_eq!(table.records.len(), 6);

    let (sales, cleaning) = clean_table(&table);
    assert_eq!(sales.len(), 3);
    assert_eq!(cleaning.duplicates_removed, 3);
    for record in &sales.records {
        assert!(!record.region.is_empty());
        assert!(!record.product.is_empty());
    }
}

#[test]
fn strict_mode_rejects_incomplete_file() {
    let raw = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_file(raw.path(), "good.csv", MINIMAL_CSV);
    write_file(raw.path(), "partial.csv", "order_id,date,region\n1,2025-01-01,North\n");

    let mut cfg = config(raw.path(), out.path(), vec![ExportFormat::Csv]);
    let lenient = run_pipeline(&cfg).unwrap();
    assert_eq!(lenient.skipped_files.len(), 1);
    assert_eq!(lenient.clean_rows, 3);

    cfg.strict = true;
    let err = run_pipeline(&cfg).unwrap_err();
    assert!(matches!(err, PipelineError::MissingColumns { .. }));
}

#[test]
fn workbook_text_and_excel_dates_are_loaded() {
    let raw = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_workbook(raw.path(), "sales_part_c.xlsx");

    let table = load_directory(raw.path(), false).unwrap();
    let (sales, cleaning) = clean_table(&table);
    assert_eq!(sales.len(), 2);
    assert_eq!(cleaning.dropped_rows, 0);
    assert_eq!(cleaning.imputed_values, 1);
    let dates: Vec<NaiveDate> = sales.records.iter().map(|r| r.date).collect();
    assert_eq!(
        dates,
        vec![
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 3).unwrap(),
        ]
    );
    assert_eq!(sales.records[1].order_id, Some(4));
    assert_eq!(sales.records[1].discount, 0.0);

    run_pipeline(&config(raw.path(), out.path(), vec![ExportFormat::Csv])).unwrap();
    assert_eq!(
        read(out.path().join("monthly_sales.csv")),
        "month,revenue,orders,units,avg_order_value\n\
         2025-01,1000.00,1,2,1000.00\n\
         2025-02,300.00,1,1,300.00\n"
    );
}

#[test]
fn workbook_rows_deduplicate_against_csv() {
    let raw = TempDir::new().unwrap();
    write_file(raw.path(), "sales_part_a.csv", MINIMAL_CSV);
    write_workbook(raw.path(), "sales_part_c.xlsx");

    let table = load_directory(raw.path(), true).unwrap();
    assert_eq!(table.loaded_files.len(), 2);

    let (sales, cleaning) = clean_table(&table);
    assert_eq!(cleaning.duplicates_removed, 1);
    assert_eq!(sales.len(), 4);
    for record in &sales.records {
        assert!(!record.region.is_empty());
        assert!(!record.product.is_empty());
    }
}

#[test]
fn unwritable_output_dir_is_fatal() {
    let raw = TempDir::new().unwrap();
    let parent = TempDir::new().unwrap();
    seed_raw_dir(raw.path());
    let out_file = write_file(parent.path(), "reports", "already a file");

    let err = run_pipeline(&config(raw.path(), &out_file, vec![ExportFormat::Csv])).unwrap_err();

    assert!(matches!(err, PipelineError::Output { .. }));
    assert!(err.to_string().starts_with("Cannot write"));
}
