//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use std::fs;
use std::path::{Path, PathBuf};

pub const CSV_HEADER: &str = "order_id,date,region,product,quantity,unit_price,discount,payment_method";

/// Three orders spanning two months, two regions and two products.
///
/// Revenues: 1000.00 (North/Laptop, Jan), 150.00 (South/Phone, Jan),
/// 400.00 (South/Laptop, Feb).
pub const MINIMAL_CSV: &str = "\
order_id,date,region,product,quantity,unit_price,discount,payment_method
1,2025-01-15,North,Laptop,2,500,0,UPI
2,2025-01-20,South,Phone,1,300,0.5,Card
3,2025-02-03,South,Laptop,1,400,0,COD
";

/// Repeats order 1 from [`MINIMAL_CSV`] and adds a row with no region.
pub const OVERLAP_JSONL: &str = r#"{"order_id":1,"date":"2025-01-15","region":"north","product":"Laptop","quantity":2,"unit_price":500.0,"discount":0,"payment_method":"UPI"}
{"order_id":9,"date":"2025-01-16","region":null,"product":"Phone","quantity":1,"unit_price":300.0,"discount":0,"payment_method":"UPI"}
"#;

/// Writes a two-order workbook.
///
/// Order 1 repeats the first row of [`MINIMAL_CSV`] with its date as text.
/// Order 4 carries a real Excel date cell (2025-02-03) and a blank discount:
/// South, Phone, 1 x 300.00.
pub fn write_workbook(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        for (col, header) in CSV_HEADER.split(',').enumerate() {
            sheet.write_string(0, col as u16, header).unwrap();
        }

        sheet.write_number(1, 0, 1.0).unwrap();
        sheet.write_string(1, 1, "2025-01-15").unwrap();
        sheet.write_string(1, 2, "North").unwrap();
        sheet.write_string(1, 3, "Laptop").unwrap();
        sheet.write_number(1, 4, 2.0).unwrap();
        sheet.write_number(1, 5, 500.0).unwrap();
        sheet.write_number(1, 6, 0.0).unwrap();
        sheet.write_string(1, 7, "UPI").unwrap();

        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let date = ExcelDateTime::from_ymd(2025, 2, 3).unwrap();
        sheet.write_number(2, 0, 4.0).unwrap();
        sheet
            .write_datetime_with_format(2, 1, &date, &date_format)
            .unwrap();
        sheet.write_string(2, 2, "South").unwrap();
        sheet.write_string(2, 3, "Phone").unwrap();
        sheet.write_number(2, 4, 1.0).unwrap();
        sheet.write_number(2, 5, 300.0).unwrap();
        sheet.write_string(2, 7, "Card").unwrap();
    }
    workbook.save(&path).unwrap();
    path
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

/// Writes the minimal fixture plus an overlapping JSON file and a stray text file.
pub fn seed_raw_dir(dir: &Path) {
    write_file(dir, "sales_part_a.csv", MINIMAL_CSV);
    write_file(dir, "sales_part_b.json", OVERLAP_JSONL);
    write_file(dir, "README.txt", "not a dataset");
}

/// Deterministic synthetic CSV with `rows` orders over six months.
pub fn synthetic_csv(rows: usize) -> String {
    let regions = ["North", "South", "East", "West"];
    let products = ["Laptop", "Phone", "Headphones", "Camera", "Smartwatch", "Tablet"];
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for i in 0..rows {
        let month = i % 6 + 1;
        let day = i % 28 + 1;
        out.push_str(&format!(
            "{},2025-{:02}-{:02},{},{},{},{:.2},{:.2},UPI\n",
            100_000 + i,
            month,
            day,
            regions[i % regions.len()],
            products[(i * 7) % products.len()],
            i % 3 + 1,
            1000.0 + (i % 17) as f64 * 123.45,
            (i % 5) as f64 * 0.05,
        ));
    }
    out
}

pub fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).unwrap()
}
