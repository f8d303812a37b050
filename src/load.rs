use crate::error::{PipelineError, Result};
use crate::structs::{ExportFormat, Summaries, SummaryTable};
use arrow_array::{Float64Array, Int64Array, RecordBatch, StringArray, UInt64Array};
use arrow_schema::{DataType, Field, Schema};
use csv::Writer;
use log::debug;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Writes every summary in each requested format under `out_dir`.
///
/// CSV is always written, whether or not it is listed in `formats`.
///
/// # Returns
/// The paths written, in write order.
///
/// # Errors
/// Returns the first write failure.
pub fn write_summaries(
    summaries: &Summaries,
    out_dir: &Path,
    formats: &[ExportFormat],
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for summary in summaries.iter() {
        let stem = summary.dimension.table_stem();

        let csv_path = out_dir.join(format!("{}.csv", stem));
        write_csv(summary, &csv_path)?;
        written.push(csv_path);

        if formats.contains(&ExportFormat::Json) {
            let json_path = out_dir.join(format!("{}.json", stem));
            write_json(summary, &json_path)?;
            written.push(json_path);
        }
        if formats.contains(&ExportFormat::Parquet) {
            let parquet_path = out_dir.join(format!("{}.parquet", stem));
            write_parquet(summary, &parquet_path)?;
            written.push(parquet_path);
        }
    }
    Ok(written)
}

/// Writes a summary to CSV with two-decimal money values.
///
/// # Arguments
/// * `summary` - Summary table to write
/// * `output_path` - Path where the CSV file will be created
///
/// # Errors
/// Returns error if file cannot be created or written to.
pub fn write_csv(summary: &SummaryTable, output_path: &Path) -> Result<()> {
    let file = create(output_path)?;
    let mut writer = Writer::from_writer(file);

    writer.write_record([
        summary.dimension.key_column(),
        "revenue",
        "orders",
        "units",
        "avg_order_value",
    ])?;

    for row in &summary.rows {
        writer.write_record(&[
            row.key.clone(),
            format!("{:.2}", row.revenue),
            row.orders.to_string(),
            row.units.to_string(),
            format!("{:.2}", row.avg_order_value),
        ])?;
    }

    writer
        .flush()
        .map_err(|e| PipelineError::output(output_path, e))?;
    debug!("Wrote {}", output_path.display());
    Ok(())
}

/// Writes a summary to a pretty-formatted JSON file.
///
/// # Errors
/// Returns error if file cannot be created or serialization fails.
pub fn write_json(summary: &SummaryTable, output_path: &Path) -> Result<()> {
    let file = create(output_path)?;
    serde_json::to_writer_pretty(file, summary)?;
    debug!("Wrote {}", output_path.display());
    Ok(())
}

/// Writes a summary to a columnar Parquet file using Arrow format.
///
/// # Errors
/// Returns error if file cannot be created, schema is invalid, or Arrow operations fail.
pub fn write_parquet(summary: &SummaryTable, output_path: &Path) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new(summary.dimension.key_column(), DataType::Utf8, false),
        Field::new("revenue", DataType::Float64, false),
        Field::new("orders", DataType::UInt64, false),
        Field::new("units", DataType::Int64, false),
        Field::new("avg_order_value", DataType::Float64, false),
    ]));

    let rows = &summary.rows;
    let keys = StringArray::from_iter_values(rows.iter().map(|r| r.key.as_str()));
    let revenue: Float64Array = rows.iter().map(|r| r.revenue).collect();
    let orders: UInt64Array = rows.iter().map(|r| r.orders).collect();
    let units: Int64Array = rows.iter().map(|r| r.units).collect();
    let avg_order_value: Float64Array = rows.iter().map(|r| r.avg_order_value).collect();

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(keys),
            Arc::new(revenue),
            Arc::new(orders),
            Arc::new(units),
            Arc::new(avg_order_value),
        ],
    )?;

    let file = create(output_path)?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    debug!("Wrote {}", output_path.display());
    Ok(())
}

fn create(path: &Path) -> Result<File> {
    File::create(path).map_err(|e| PipelineError::output(path, e))
}
