use crate::structs::{Cell, CleaningReport, Column, RawRecord, RawTable, SalesRecord, SalesTable};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::debug;
use std::collections::HashSet;

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%d/%m/%Y"];
const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Cleans the loaded rows into typed sales records.
///
/// Rows without a usable date, region or product are dropped. Missing or
/// unparseable quantity, unit price and discount values are imputed as zero.
/// Text labels are whitespace-normalized and title-cased, then exact
/// duplicates are removed keeping the first occurrence. Revenue is derived as
/// `quantity * unit_price * (1 - discount)`.
pub fn clean_table(raw: &RawTable) -> (SalesTable, CleaningReport) {
    let mut report = CleaningReport {
        input_rows: raw.records.len(),
        ..CleaningReport::default()
    };
    let mut seen: HashSet<RowKey> = HashSet::new();
    let mut records = Vec::with_capacity(raw.records.len());

    for raw_record in &raw.records {
        let Some(record) = clean_record(raw_record, &mut report.imputed_values) else {
            report.dropped_rows += 1;
            continue;
        };
        if seen.insert(RowKey::from(&record)) {
            records.push(record);
        } else {
            report.duplicates_removed += 1;
        }
    }

    debug!(
        "Cleaning kept {} of {} rows ({} dropped, {} duplicates, {} values imputed)",
        records.len(),
        report.input_rows,
        report.dropped_rows,
        report.duplicates_removed,
        report.imputed_values
    );
    (SalesTable { records }, report)
}

fn clean_record(raw: &RawRecord, imputed: &mut usize) -> Option<SalesRecord> {
    let date = parse_date(raw.get(Column::Date))?;
    let region = normalize_label(raw.get(Column::Region))?;
    let product = normalize_label(raw.get(Column::Product))?;

    let mut number_or_zero = |column: Column| match cell_number(raw.get(column)) {
        Some(value) => value,
        None => {
            *imputed += 1;
            0.0
        }
    };
    let quantity = number_or_zero(Column::Quantity).trunc() as i64;
    let unit_price = number_or_zero(Column::UnitPrice);
    let discount = number_or_zero(Column::Discount).clamp(0.0, 1.0);

    let order_id = cell_number(raw.get(Column::OrderId)).map(|id| id.trunc() as i64);
    let payment_method = cell_text(raw.get(Column::PaymentMethod))
        .map(|s| collapse_whitespace(&s))
        .filter(|s| !s.is_empty());

    let revenue = quantity as f64 * unit_price * (1.0 - discount);

    Some(SalesRecord {
        order_id,
        date,
        region,
        product,
        quantity,
        unit_price,
        discount,
        payment_method,
        revenue,
    })
}

/// Coerces a cell to a calendar date.
///
/// Text is tried against the supported date and date-time layouts and RFC
/// 3339; numbers are read as epoch milliseconds.
pub fn parse_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Date(date) => Some(*date),
        Cell::Number(millis) if millis.is_finite() => {
            DateTime::from_timestamp_millis(*millis as i64).map(|dt| dt.date_naive())
        }
        Cell::Text(text) => {
            let text = text.trim();
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .or_else(|| {
                    DATETIME_FORMATS
                        .iter()
                        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                        .map(|dt| dt.date())
                })
                .or_else(|| {
                    DateTime::parse_from_rfc3339(text)
                        .ok()
                        .map(|dt| dt.date_naive())
                })
        }
        _ => None,
    }
}

/// Trims, collapses inner whitespace and title-cases a label.
/// Returns `None` when nothing is left.
pub fn normalize_label(cell: &Cell) -> Option<String> {
    let text = cell_text(cell)?;
    let label = text
        .split_whitespace()
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ");
    if label.is_empty() { None } else { Some(label) }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn cell_text(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Empty => None,
        Cell::Text(text) => Some(text.clone()),
        Cell::Number(n) if n.fract() == 0.0 && n.is_finite() => Some(format!("{}", *n as i64)),
        Cell::Number(n) => Some(n.to_string()),
        Cell::Date(date) => Some(date.to_string()),
    }
}

fn cell_number(cell: &Cell) -> Option<f64> {
    let value = match cell {
        Cell::Number(n) => *n,
        Cell::Text(text) => text.trim().parse::<f64>().ok()?,
        Cell::Empty | Cell::Date(_) => return None,
    };
    value.is_finite().then_some(value)
}

/// Hashable identity of a cleaned row used for exact-duplicate removal.
#[derive(PartialEq, Eq, Hash)]
struct RowKey {
    order_id: Option<i64>,
    date: NaiveDate,
    region: String,
    product: String,
    quantity: i64,
    unit_price: u64,
    discount: u64,
    payment_method: Option<String>,
}

impl From<&SalesRecord> for RowKey {
    fn from(record: &SalesRecord) -> Self {
        // +0.0 folds -0.0 into 0.0 so both hash alike
        Self {
            order_id: record.order_id,
            date: record.date,
            region: record.region.clone(),
            product: record.product.clone(),
            quantity: record.quantity,
            unit_price: (record.unit_price + 0.0).to_bits(),
            discount: (record.discount + 0.0).to_bits(),
            payment_method: record.payment_method.clone(),
        }
    }
}
