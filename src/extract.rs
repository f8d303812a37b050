use crate::error::{PipelineError, Result};
use crate::structs::{Cell, Column, RawRecord, RawTable};
use arrow_array::cast::AsArray;
use arrow_array::{
    Array, ArrayRef, BooleanArray, Date32Array, Date64Array, Float32Array, Float64Array,
    Int8Array, Int16Array, Int32Array, Int64Array, LargeStringArray, StringArray,
    TimestampMicrosecondArray, TimestampMillisecondArray, TimestampNanosecondArray,
    TimestampSecondArray, UInt8Array, UInt16Array, UInt32Array, UInt64Array,
};
use arrow_schema::{DataType, TimeUnit};
use calamine::{Data, Reader, open_workbook_auto};
use log::{debug, info, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::{Map, Value};
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

type JsonObject = Map<String, Value>;

/// Raw file formats the loader understands, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Json,
    Spreadsheet,
    Parquet,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Option<InputFormat> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(InputFormat::Csv),
            "json" | "jsonl" | "ndjson" => Some(InputFormat::Json),
            "xlsx" | "xlsm" | "xls" | "ods" => Some(InputFormat::Spreadsheet),
            "parquet" | "pq" => Some(InputFormat::Parquet),
            _ => None,
        }
    }
}

/// Loads every supported file in `raw_dir` into one raw table.
///
/// Files are visited in sorted name order. Unsupported extensions are always
/// skipped with a warning. Files that fail to parse or lack required columns
/// are skipped as well, unless `strict` is set, in which case the first such
/// file aborts the load.
///
/// # Errors
///
/// Returns `PipelineError::InputDirMissing` if `raw_dir` is not a directory,
/// `PipelineError::NoValidInput` if no file was accepted, or the per-file
/// error in strict mode.
pub fn load_directory(raw_dir: &Path, strict: bool) -> Result<RawTable> {
    if !raw_dir.is_dir() {
        return Err(PipelineError::InputDirMissing(raw_dir.to_path_buf()));
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(raw_dir)?
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(err) => {
                warn!("Skipping unreadable entry in {}: {}", raw_dir.display(), err);
                None
            }
        })
        .filter(|path| path.is_file())
        .collect();
    paths.sort();
    debug!("Found {} files in {}", paths.len(), raw_dir.display());

    let mut table = RawTable::default();
    for path in paths {
        let name = file_name(&path);
        let Some(format) = InputFormat::from_path(&path) else {
            warn!("Skipping unsupported file {}", name);
            table.skipped_files.push(path);
            continue;
        };

        match read_file_as(&path, format) {
            Ok(records) => {
                info!("Loaded {} -> {} rows", name, records.len());
                table.records.extend(records);
                table.loaded_files.push(path);
            }
            Err(err) if !strict && err.is_skippable() => {
                warn!("Skipping {}: {}", name, err);
                table.skipped_files.push(path);
            }
            Err(err) => return Err(err),
        }
    }

    if table.loaded_files.is_empty() {
        return Err(PipelineError::NoValidInput(raw_dir.to_path_buf()));
    }
    Ok(table)
}

/// Reads a single raw file, picking the reader from its extension.
///
/// # Errors
///
/// Returns `PipelineError::UnsupportedFormat` for unknown extensions,
/// `PipelineError::MissingColumns` if the header lacks a required column, or
/// the underlying reader's error.
pub fn read_file(path: &Path) -> Result<Vec<RawRecord>> {
    let format = InputFormat::from_path(path)
        .ok_or_else(|| PipelineError::UnsupportedFormat(path.to_path_buf()))?;
    read_file_as(path, format)
}

fn read_file_as(path: &Path, format: InputFormat) -> Result<Vec<RawRecord>> {
    match format {
        InputFormat::Csv => read_csv(path),
        InputFormat::Json => read_json(path),
        InputFormat::Spreadsheet => read_spreadsheet(path),
        InputFormat::Parquet => read_parquet(path),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Resolves each header to a canonical column and checks that every required
/// column is present.
fn map_headers<S: AsRef<str>>(path: &Path, headers: &[S]) -> Result<Vec<Option<Column>>> {
    let columns: Vec<Option<Column>> = headers
        .iter()
        .map(|h| Column::from_header(h.as_ref()))
        .collect();

    let missing: Vec<String> = Column::REQUIRED
        .iter()
        .filter(|required| !columns.contains(&Some(**required)))
        .map(|c| c.name().to_string())
        .collect();

    if missing.is_empty() {
        Ok(columns)
    } else {
        Err(PipelineError::MissingColumns {
            file: file_name(path),
            missing,
        })
    }
}

fn read_csv(path: &Path) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let columns = map_headers(path, &headers)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut record = RawRecord::default();
        for (value, column) in row.iter().zip(&columns) {
            if let Some(column) = column {
                record.set(*column, Cell::from_text(value));
            }
        }
        records.push(record);
    }
    Ok(records)
}

/// Reads JSON-lines, falling back to a single array of objects.
fn read_json(path: &Path) -> Result<Vec<RawRecord>> {
    let text = fs::read_to_string(path)?;
    let objects = match parse_json_lines(&text) {
        Ok(objects) => objects,
        Err(err) => {
            debug!(
                "{} is not JSON-lines ({}), trying a JSON array",
                file_name(path),
                err
            );
            serde_json::from_str::<Vec<JsonObject>>(&text)?
        }
    };

    let mut headers: Vec<&str> = Vec::new();
    for object in &objects {
        for key in object.keys() {
            if !headers.contains(&key.as_str()) {
                headers.push(key.as_str());
            }
        }
    }
    map_headers(path, &headers)?;

    Ok(objects
        .iter()
        .map(|object| {
            let mut record = RawRecord::default();
            for (key, value) in object {
                if let Some(column) = Column::from_header(key) {
                    record.set(column, json_cell(value));
                }
            }
            record
        })
        .collect())
}

fn parse_json_lines(text: &str) -> std::result::Result<Vec<JsonObject>, serde_json::Error> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(serde_json::from_str::<JsonObject>)
        .collect()
}

fn json_cell(value: &Value) -> Cell {
    match value {
        Value::Null => Cell::Empty,
        Value::String(s) => Cell::from_text(s),
        Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or_default(),
        other => Cell::Text(other.to_string()),
    }
}

/// Reads the first worksheet; its first row is the header.
fn read_spreadsheet(path: &Path) -> Result<Vec<RawRecord>> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| PipelineError::Data(format!("{} has no worksheets", file_name(path))))??;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .unwrap_or_default();
    let columns = map_headers(path, &headers)?;

    Ok(rows
        .filter(|row| row.iter().any(|c| !matches!(c, Data::Empty)))
        .map(|row| {
            let mut record = RawRecord::default();
            for (value, column) in row.iter().zip(&columns) {
                if let Some(column) = column {
                    record.set(*column, spreadsheet_cell(value));
                }
            }
            record
        })
        .collect())
}

fn spreadsheet_cell(value: &Data) -> Cell {
    match value {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::from_text(s),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| Cell::Date(d.date()))
            .unwrap_or_default(),
    }
}

fn read_parquet(path: &Path) -> Result<Vec<RawRecord>> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().to_string())
        .collect();
    let columns = map_headers(path, &headers)?;
    let reader = builder.build()?;

    let mut records: Vec<RawRecord> = Vec::new();
    for batch_result in reader {
        let batch = batch_result.map_err(PipelineError::Arrow)?;
        let start = records.len();
        records.resize(start + batch.num_rows(), RawRecord::default());

        for (index, column) in columns.iter().enumerate() {
            let Some(column) = column else { continue };
            for (row, cell) in column_cells(batch.column(index))?.into_iter().enumerate() {
                records[start + row].set(*column, cell);
            }
        }
    }
    Ok(records)
}

/// Converts one Arrow column to cells, resolving dictionary-encoded columns
/// through their values array.
fn column_cells(array: &ArrayRef) -> Result<Vec<Cell>> {
    if let Some(dictionary) = array.as_any_dictionary_opt() {
        let keys = dictionary.normalized_keys();
        return (0..array.len())
            .map(|row| {
                if dictionary.keys().is_null(row) {
                    Ok(Cell::Empty)
                } else {
                    arrow_cell(dictionary.values(), keys[row])
                }
            })
            .collect();
    }
    (0..array.len()).map(|row| arrow_cell(array, row)).collect()
}

fn arrow_cell(array: &ArrayRef, row: usize) -> Result<Cell> {
    if array.is_null(row) {
        return Ok(Cell::Empty);
    }

    let cell = match array.data_type() {
        DataType::Utf8 => Cell::from_text(downcast::<StringArray>(array)?.value(row)),
        DataType::LargeUtf8 => Cell::from_text(downcast::<LargeStringArray>(array)?.value(row)),
        DataType::Int64 => Cell::Number(downcast::<Int64Array>(array)?.value(row) as f64),
        DataType::Int32 => Cell::Number(downcast::<Int32Array>(array)?.value(row) as f64),
        DataType::Int16 => Cell::Number(downcast::<Int16Array>(array)?.value(row) as f64),
        DataType::Int8 => Cell::Number(downcast::<Int8Array>(array)?.value(row) as f64),
        DataType::UInt64 => Cell::Number(downcast::<UInt64Array>(array)?.value(row) as f64),
        DataType::UInt32 => Cell::Number(downcast::<UInt32Array>(array)?.value(row) as f64),
        DataType::UInt16 => Cell::Number(downcast::<UInt16Array>(array)?.value(row) as f64),
        DataType::UInt8 => Cell::Number(downcast::<UInt8Array>(array)?.value(row) as f64),
        DataType::Float64 => Cell::Number(downcast::<Float64Array>(array)?.value(row)),
        DataType::Float32 => Cell::Number(downcast::<Float32Array>(array)?.value(row) as f64),
        DataType::Boolean => Cell::Text(downcast::<BooleanArray>(array)?.value(row).to_string()),
        DataType::Date32 => date_cell(downcast::<Date32Array>(array)?.value_as_date(row)),
        DataType::Date64 => date_cell(downcast::<Date64Array>(array)?.value_as_date(row)),
        DataType::Timestamp(TimeUnit::Second, _) => {
            date_cell(downcast::<TimestampSecondArray>(array)?.value_as_date(row))
        }
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            date_cell(downcast::<TimestampMillisecondArray>(array)?.value_as_date(row))
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            date_cell(downcast::<TimestampMicrosecondArray>(array)?.value_as_date(row))
        }
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            date_cell(downcast::<TimestampNanosecondArray>(array)?.value_as_date(row))
        }
        other => {
            return Err(PipelineError::Data(format!(
                "Unsupported Parquet column type {}",
                other
            )));
        }
    };
    Ok(cell)
}

fn date_cell(date: Option<chrono::NaiveDate>) -> Cell {
    date.map(Cell::Date).unwrap_or_default()
}

fn downcast<T: 'static>(array: &ArrayRef) -> Result<&T> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        PipelineError::Data(format!(
            "Column of type {} is not {}",
            array.data_type(),
            std::any::type_name::<T>()
        ))
    })
}
