use clap::Parser;
use log::debug;
use sales_etl::{ExportFormat, PipelineConfig, PipelineError, logging, run_pipeline};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding raw CSV / JSON / XLSX / Parquet sales files
    #[arg(long, default_value = "data/raw")]
    raw_dir: PathBuf,

    /// Directory for summary tables, charts and the PDF report
    #[arg(long, default_value = "reports")]
    out_dir: PathBuf,

    /// Summary table formats (e.g. csv,json,parquet). CSV is always written.
    #[arg(long, value_delimiter = ',', default_value = "csv")]
    format: Vec<ExportFormat>,

    /// Abort on the first malformed or incomplete input file instead of skipping it
    #[arg(long, default_value_t = false)]
    strict: bool,

    /// Title printed at the top of the PDF report
    #[arg(long, default_value = "Flipkart Sales Report")]
    title: String,

    /// Log level for output
    #[arg(long, default_value_t = false)]
    debug: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), PipelineError> {
    let total_start = Instant::now();
    logging::init(args.debug)?;

    println!("Flipkart sales pipeline");
    debug!(
        "Raw dir: {} | Out dir: {} | Formats: {:?} | Strict: {}",
        args.raw_dir.display(),
        args.out_dir.display(),
        args.format,
        args.strict
    );

    let config = PipelineConfig {
        raw_dir: args.raw_dir,
        out_dir: args.out_dir,
        formats: args.format,
        strict: args.strict,
        title: args.title,
    };

    let report = run_pipeline(&config)?;

    println!(
        "\nProcessed {} clean rows from {} files | Total revenue: {:.2}",
        report.clean_rows,
        report.loaded_files.len(),
        report.total_revenue
    );
    println!("Wrote files to directory: {}", config.out_dir.display());
    for artifact in &report.artifacts {
        debug!("  - {}", artifact.display());
    }

    println!("Pipeline completed successfully in {:.2?}", total_start.elapsed());
    Ok(())
}
