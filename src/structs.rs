use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Canonical input columns recognised by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    OrderId,
    Date,
    Region,
    Product,
    Quantity,
    UnitPrice,
    Discount,
    PaymentMethod,
}

impl Column {
    pub const ALL: [Column; 8] = [
        Column::OrderId,
        Column::Date,
        Column::Region,
        Column::Product,
        Column::Quantity,
        Column::UnitPrice,
        Column::Discount,
        Column::PaymentMethod,
    ];

    pub const REQUIRED: [Column; 7] = [
        Column::OrderId,
        Column::Date,
        Column::Region,
        Column::Product,
        Column::Quantity,
        Column::UnitPrice,
        Column::Discount,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::OrderId => "order_id",
            Column::Date => "date",
            Column::Region => "region",
            Column::Product => "product",
            Column::Quantity => "quantity",
            Column::UnitPrice => "unit_price",
            Column::Discount => "discount",
            Column::PaymentMethod => "payment_method",
        }
    }

    /// Maps a raw header to a canonical column after normalizing it
    /// (`" Unit Price "` and `"unit-price"` both become `unit_price`).
    pub fn from_header(header: &str) -> Option<Column> {
        let normalized = normalize_header(header);
        Column::ALL.into_iter().find(|c| c.name() == normalized)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Lower-cases a header and folds runs of spaces, hyphens and dots into `_`.
pub fn normalize_header(header: &str) -> String {
    let mut out = String::with_capacity(header.len());
    let mut pending_sep = false;
    for ch in header.trim().chars() {
        if ch.is_whitespace() || ch == '-' || ch == '.' || ch == '_' {
            pending_sep = true;
            continue;
        }
        if pending_sep && !out.is_empty() {
            out.push('_');
        }
        pending_sep = false;
        out.extend(ch.to_lowercase());
    }
    out
}

/// A raw value as read from an input file, before type coercion.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Cell {
    /// Builds a cell from text, treating blank strings as empty.
    pub fn from_text(text: &str) -> Cell {
        if text.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(text.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

/// One input row with a cell per canonical column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    cells: [Cell; 8],
}

impl RawRecord {
    pub fn get(&self, column: Column) -> &Cell {
        &self.cells[column.index()]
    }

    pub fn set(&mut self, column: Column, cell: Cell) {
        self.cells[column.index()] = cell;
    }

    pub fn with(mut self, column: Column, cell: Cell) -> Self {
        self.set(column, cell);
        self
    }
}

/// Unified output of the loader: every row from every accepted file.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub records: Vec<RawRecord>,
    pub loaded_files: Vec<PathBuf>,
    pub skipped_files: Vec<PathBuf>,
}

/// Cleaned, typed sales row.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub order_id: Option<i64>,
    pub date: NaiveDate,
    pub region: String,
    pub product: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub discount: f64,
    pub payment_method: Option<String>,
    pub revenue: f64,
}

/// The cleaned rows of one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct SalesTable {
    pub records: Vec<SalesRecord>,
}

impl SalesTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_revenue(&self) -> f64 {
        self.records.iter().map(|r| r.revenue).sum()
    }
}

/// Counters collected while cleaning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleaningReport {
    pub input_rows: usize,
    pub dropped_rows: usize,
    pub duplicates_removed: usize,
    pub imputed_values: usize,
}

/// Grouping dimension of a summary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dimension {
    Month,
    Region,
    Product,
}

/// How a summary is rendered as a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    Bar,
}

impl Dimension {
    pub fn key_column(self) -> &'static str {
        match self {
            Dimension::Month => "month",
            Dimension::Region => "region",
            Dimension::Product => "product",
        }
    }

    pub fn table_stem(self) -> &'static str {
        match self {
            Dimension::Month => "monthly_sales",
            Dimension::Region => "regional_sales",
            Dimension::Product => "product_sales",
        }
    }

    pub fn chart_stem(self) -> &'static str {
        match self {
            Dimension::Month => "monthly_trend",
            Dimension::Region => "regional_sales",
            Dimension::Product => "product_sales",
        }
    }

    pub fn chart_kind(self) -> ChartKind {
        match self {
            Dimension::Month => ChartKind::Line,
            Dimension::Region | Dimension::Product => ChartKind::Bar,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Dimension::Month => "Monthly Sales",
            Dimension::Region => "Regional Sales",
            Dimension::Product => "Product Sales",
        }
    }
}

/// Aggregated figures for one grouping key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub key: String,
    pub revenue: f64,
    pub orders: u64,
    pub units: i64,
    pub avg_order_value: f64,
}

/// One dimension's summary, rows sorted by key ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryTable {
    pub dimension: Dimension,
    pub rows: Vec<SummaryRow>,
}

impl SummaryTable {
    pub fn total_revenue(&self) -> f64 {
        self.rows.iter().map(|r| r.revenue).sum()
    }
}

/// The three summaries produced by the aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct Summaries {
    pub monthly: SummaryTable,
    pub regional: SummaryTable,
    pub product: SummaryTable,
}

impl Summaries {
    pub fn iter(&self) -> impl Iterator<Item = &SummaryTable> {
        [&self.monthly, &self.regional, &self.product].into_iter()
    }
}

/// Summary table output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
    Parquet,
}

/// Configuration for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub raw_dir: PathBuf,
    pub out_dir: PathBuf,
    pub formats: Vec<ExportFormat>,
    pub strict: bool,
    pub title: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("data/raw"),
            out_dir: PathBuf::from("reports"),
            formats: vec![ExportFormat::Csv],
            strict: false,
            title: "Flipkart Sales Report".to_string(),
        }
    }
}
