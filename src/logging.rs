use crate::error::{PipelineError, Result};
use log::{Level, LevelFilter, Log, Metadata, Record as LogRecord};

/// Line-oriented logger for the pipeline binary.
///
/// Warnings and errors go to stderr so skipped-file notices stay visible when
/// stdout is redirected; everything else goes to stdout.
pub struct PipelineLogger;

static LOGGER: PipelineLogger = PipelineLogger;

impl Log for PipelineLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &LogRecord) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.level() {
            Level::Error | Level::Warn => eprintln!("[{}] {}", record.level(), record.args()),
            _ => println!("[{}] {}", record.level(), record.args()),
        }
    }

    fn flush(&self) {}
}

/// Installs the pipeline logger at `Debug` or `Info` level.
pub fn init(debug: bool) -> Result<()> {
    log::set_logger(&LOGGER).map_err(|e| PipelineError::Logger(e.to_string()))?;
    log::set_max_level(level_for(debug));
    Ok(())
}

fn level_for(debug: bool) -> LevelFilter {
    if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}
