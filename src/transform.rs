use crate::structs::{Dimension, SalesRecord, SalesTable, Summaries, SummaryRow, SummaryTable};
use chrono::Datelike;
use log::debug;
use std::collections::HashMap;

/// Builds the monthly, regional and product summaries of a cleaned table.
///
/// Each summary sums revenue and units and counts orders per grouping key;
/// rows come back sorted by key ascending. An empty table yields three empty
/// summaries.
pub fn summarize(table: &SalesTable) -> Summaries {
    Summaries {
        monthly: aggregate(table, Dimension::Month),
        regional: aggregate(table, Dimension::Region),
        product: aggregate(table, Dimension::Product),
    }
}

/// Groups the table by one dimension.
pub fn aggregate(table: &SalesTable, dimension: Dimension) -> SummaryTable {
    let mut groups: HashMap<String, Totals> = HashMap::new();
    for record in &table.records {
        groups
            .entry(group_key(record, dimension))
            .or_default()
            .add(record);
    }
    debug!("Found {} groups by {}", groups.len(), dimension.key_column());

    let mut rows: Vec<SummaryRow> = groups
        .into_iter()
        .map(|(key, totals)| totals.into_row(key))
        .collect();
    rows.sort_by(|a, b| a.key.cmp(&b.key));

    SummaryTable { dimension, rows }
}

/// Grouping key of a record: `YYYY-MM` for months, the label otherwise.
pub fn group_key(record: &SalesRecord, dimension: Dimension) -> String {
    match dimension {
        Dimension::Month => format!("{:04}-{:02}", record.date.year(), record.date.month()),
        Dimension::Region => record.region.clone(),
        Dimension::Product => record.product.clone(),
    }
}

#[derive(Default)]
struct Totals {
    revenue: f64,
    orders: u64,
    units: i64,
}

impl Totals {
    fn add(&mut self, record: &SalesRecord) {
        self.revenue += record.revenue;
        self.orders += 1;
        self.units += record.quantity;
    }

    fn into_row(self, key: String) -> SummaryRow {
        let avg_order_value = if self.orders == 0 {
            0.0
        } else {
            self.revenue / self.orders as f64
        };
        SummaryRow {
            key,
            revenue: self.revenue,
            orders: self.orders,
            units: self.units,
            avg_order_value,
        }
    }
}
