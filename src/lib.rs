pub mod chart;
pub mod clean;
pub mod error;
pub mod extract;
pub mod load;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod structs;
pub mod transform;

// Re-export public API
pub use clean::clean_table;
pub use error::{PipelineError, Result};
pub use extract::{load_directory, read_file};
pub use load::{write_csv, write_json, write_parquet, write_summaries};
pub use pipeline::{PipelineReport, run_pipeline};
pub use structs::{
    Dimension, ExportFormat, PipelineConfig, SalesRecord, SalesTable, Summaries, SummaryRow,
    SummaryTable,
};
pub use transform::summarize;
