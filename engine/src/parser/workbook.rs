//! Spreadsheet reading via calamine (xlsx, xlsm, xlsb, xls, ods).

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use chrono::NaiveDateTime;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use crate::error::IngestResult;
use crate::models::{CellValue, Grid};

/// Read every sheet of a workbook on disk, in workbook order.
pub fn read_workbook(path: &Path) -> IngestResult<Vec<Grid>> {
    let mut workbook = open_workbook_auto(path)?;
    sheets_to_grids(&mut workbook)
}

/// Read every sheet of an in-memory workbook.
pub fn read_workbook_bytes(bytes: Vec<u8>) -> IngestResult<Vec<Grid>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    sheets_to_grids(&mut workbook)
}

fn sheets_to_grids<RS>(workbook: &mut Sheets<RS>) -> IngestResult<Vec<Grid>>
where
    RS: Read + Seek,
{
    let mut grids = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name)?;
        grids.push(range_to_grid(&name, &range));
    }
    Ok(grids)
}

fn range_to_grid(name: &str, range: &Range<Data>) -> Grid {
    let rows = range
        .rows()
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();
    Grid::new(name, rows)
}

/// Map a calamine cell onto a [`CellValue`].
pub fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Null,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::infer(s),
        Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(d) => CellValue::Date(d),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => parse_iso_datetime(s)
            .map(CellValue::Date)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) => CellValue::Null,
    }
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_mapping() {
        assert_eq!(cell_from_data(&Data::Empty), CellValue::Null);
        assert_eq!(cell_from_data(&Data::Int(7)), CellValue::Number(7.0));
        assert_eq!(cell_from_data(&Data::String("  ".into())), CellValue::Null);
        assert_eq!(cell_from_data(&Data::String("12.5".into())), CellValue::Number(12.5));
        assert_eq!(cell_from_data(&Data::String("Amount".into())), CellValue::Text("Amount".into()));
        assert_eq!(cell_from_data(&Data::Bool(true)), CellValue::Text("TRUE".into()));
    }

    #[test]
    fn test_iso_dates() {
        let cell = cell_from_data(&Data::DateTimeIso("2024-03-01".into()));
        assert_eq!(cell.to_text(), "2024-03-01");

        let with_time = cell_from_data(&Data::DateTimeIso("2024-03-01T10:30:00".into()));
        assert_eq!(with_time.to_text(), "2024-03-01T10:30:00");

        let junk = cell_from_data(&Data::DateTimeIso("sometime".into()));
        assert_eq!(junk, CellValue::Text("sometime".into()));
    }

    #[test]
    fn test_one_grid_per_sheet_in_workbook_order() {
        let cover: &[&[&str]] = &[&["Quarterly pack"]];
        let invoices: &[&[&str]] = &[
            &["Date", "Invoice #", "Amount"],
            &["2024-01-02", "INV2", "100"],
            &["", "INV3", "12.5"],
        ];
        let bytes = fixtures::xlsx(&[("Cover", cover), ("Invoices", invoices)]);
        let grids = read_workbook_bytes(bytes).unwrap();

        let names: Vec<&str> = grids.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Cover", "Invoices"]);
        assert_eq!(grids[0].rows[0][0], CellValue::Text("Quarterly pack".into()));

        let invoices = &grids[1];
        assert_eq!(invoices.rows.len(), 3);
        assert_eq!(invoices.rows[0][1], CellValue::Text("Invoice #".into()));
        assert_eq!(invoices.rows[1][2], CellValue::Number(100.0));
        assert_eq!(invoices.rows[2][0], CellValue::Null);
        assert_eq!(invoices.rows[2][2], CellValue::Number(12.5));
    }

    #[test]
    fn test_garbage_bytes_are_an_error() {
        assert!(read_workbook_bytes(b"definitely not a workbook".to_vec()).is_err());
    }
}
