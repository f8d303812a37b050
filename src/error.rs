use arrow_schema::ArrowError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parquet Error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("Arrow Error: {0}")]
    Arrow(#[from] ArrowError),
    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Spreadsheet Error: {0}")]
    Excel(#[from] calamine::Error),
    #[error("PDF Error: {0}")]
    Pdf(#[from] printpdf::Error),
    #[error("Input directory not found: {}", .0.display())]
    InputDirMissing(PathBuf),
    #[error("No valid datasets found in {}", .0.display())]
    NoValidInput(PathBuf),
    #[error("Unsupported file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("{file} is missing required columns: {}", .missing.join(", "))]
    MissingColumns { file: String, missing: Vec<String> },
    #[error("Data Error: {0}")]
    Data(String),
    #[error("Cannot write {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Chart Error: {0}")]
    Chart(String),
    #[error("Logger Error: {0}")]
    Logger(String),
}

impl PipelineError {
    /// Wraps an I/O failure on an output artifact with the path it concerned.
    pub fn output(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Output {
            path: path.into(),
            source,
        }
    }

    /// True for per-file problems the loader may skip over outside strict mode.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            PipelineError::Csv(_)
                | PipelineError::Json(_)
                | PipelineError::Excel(_)
                | PipelineError::Parquet(_)
                | PipelineError::Arrow(_)
                | PipelineError::Io(_)
                | PipelineError::UnsupportedFormat(_)
                | PipelineError::MissingColumns { .. }
                | PipelineError::Data(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
