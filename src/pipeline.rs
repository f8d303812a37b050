use crate::chart::render_charts;
use crate::clean::clean_table;
use crate::error::{PipelineError, Result};
use crate::extract::load_directory;
use crate::load::write_summaries;
use crate::report::{Overview, REPORT_FILE, write_report};
use crate::structs::{CleaningReport, PipelineConfig, Summaries};
use crate::transform::summarize;
use log::{debug, info};
use std::{fs, path::PathBuf, time::Instant};

/// Outcome of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub loaded_files: Vec<PathBuf>,
    pub skipped_files: Vec<PathBuf>,
    pub cleaning: CleaningReport,
    pub clean_rows: usize,
    pub total_revenue: f64,
    pub summaries: Summaries,
    pub artifacts: Vec<PathBuf>,
}

/// Runs load, clean, aggregate and export once.
///
/// Nothing is written until loading succeeded, so an input error leaves the
/// output directory untouched.
///
/// # Errors
///
/// Returns `PipelineError` if:
/// - the input directory is missing or holds no valid dataset
/// - a file is rejected in strict mode
/// - the output directory or any artifact cannot be written
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineReport> {
    info!("Loading raw data from {}", config.raw_dir.display());
    let load_start = Instant::now();
    let raw = load_directory(&config.raw_dir, config.strict)?;
    info!(
        "Rows loaded: {} from {} files ({} skipped) in {:.2?}",
        raw.records.len(),
        raw.loaded_files.len(),
        raw.skipped_files.len(),
        load_start.elapsed()
    );

    info!("Cleaning & transforming");
    let (table, cleaning) = clean_table(&raw);
    info!(
        "Rows after cleaning: {} ({} dropped, {} duplicates removed)",
        table.len(),
        cleaning.dropped_rows,
        cleaning.duplicates_removed
    );

    let summaries = summarize(&table);
    let total_revenue = table.total_revenue();
    debug!(
        "Summaries: {} months, {} regions, {} products",
        summaries.monthly.rows.len(),
        summaries.regional.rows.len(),
        summaries.product.rows.len()
    );

    info!("Writing reports to {}", config.out_dir.display());
    let export_start = Instant::now();
    fs::create_dir_all(&config.out_dir)
        .map_err(|e| PipelineError::output(&config.out_dir, e))?;

    let mut artifacts = write_summaries(&summaries, &config.out_dir, &config.formats)?;
    artifacts.extend(render_charts(&summaries, &config.out_dir)?);

    let report_path = config.out_dir.join(REPORT_FILE);
    write_report(
        &summaries,
        Overview {
            rows: table.len(),
            total_revenue,
        },
        &config.out_dir,
        &config.title,
        &report_path,
    )?;
    info!("PDF report saved to {}", report_path.display());
    artifacts.push(report_path);
    debug!(
        "Wrote {} artifacts in {:.2?}",
        artifacts.len(),
        export_start.elapsed()
    );

    Ok(PipelineReport {
        loaded_files: raw.loaded_files,
        skipped_files: raw.skipped_files,
        cleaning,
        clean_rows: table.len(),
        total_revenue,
        summaries,
        artifacts,
    })
}
