//! Header Locator
//!
//! Finds the row most likely to hold the real column headers inside a grid
//! that may start with free text (titles, account details, periods). A row
//! qualifies when enough of its text cells contain an expected token.

use crate::config::IngestOptions;
use crate::logs::LogSink;
use crate::models::{CellValue, Dataset, Grid};

use super::columns::{dedupe_labels, header_labels};

const STEP: &str = "Locate Header";
const SOURCE: &str = "HeaderLocator";

/// Outcome of header detection on a set of grids.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedTable {
    /// Name of the grid the table was taken from
    pub sheet_name: String,
    /// Index of the header row within that grid
    pub header_row: usize,
    /// Whether `header_row` was matched (false means the row 0 fallback)
    pub matched: bool,
    /// Non-blank cells above the header row, space-joined
    pub pre_header_text: String,
    /// Header labels (deduplicated) and body rows
    pub data: Dataset,
}

/// Number of text cells containing at least one token.
pub fn count_matches(row: &[CellValue], tokens: &[String]) -> usize {
    row.iter()
        .filter_map(CellValue::as_text)
        .filter(|text| {
            let lower = text.to_lowercase();
            tokens.iter().any(|t| lower.contains(t.as_str()))
        })
        .count()
}

/// First row with at least `min_matches` matching cells.
pub fn find_header_row(grid: &Grid, tokens: &[String], min_matches: usize) -> Option<usize> {
    if tokens.is_empty() {
        return None;
    }
    grid.rows
        .iter()
        .position(|row| count_matches(row, tokens) >= min_matches.max(1))
}

/// Non-blank cells of every row above `header_row`, joined by spaces.
pub fn pre_header_text(grid: &Grid, header_row: usize) -> String {
    grid.rows
        .iter()
        .take(header_row)
        .flatten()
        .filter(|cell| !cell.is_blank())
        .map(CellValue::to_text)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Pick a sheet and header row, then split the grid into text and table.
///
/// Returns `None` when every grid is empty.
pub fn locate_header(
    grids: &[Grid],
    tokens: &[String],
    options: &IngestOptions,
    log: &mut LogSink,
) -> Option<LocatedTable> {
    let candidates: Vec<&Grid> = grids.iter().filter(|g| !g.is_empty()).collect();
    if candidates.is_empty() {
        log.warning(STEP, SOURCE, format!("Sheets: {}", grids.len()), "No valid sheets found");
        return None;
    }

    let matched = candidates.iter().find_map(|grid| {
        find_header_row(grid, tokens, options.min_header_matches).map(|row| (*grid, row))
    });

    let (grid, header_row, matched) = match matched {
        Some((grid, row)) => (grid, row, true),
        None => (candidates[0], 0, false),
    };

    if matched {
        log.info(
            STEP,
            SOURCE,
            format!("Sheet: {}; Header row: {}", grid.name, header_row),
            "Header located",
        );
    } else {
        let reason = if tokens.is_empty() {
            "No expected tokens; using row 0".to_string()
        } else {
            format!(
                "No row with {} matching headers; using row 0",
                options.min_header_matches
            )
        };
        log.warning(STEP, SOURCE, format!("Sheet: {}", grid.name), reason);
    }

    Some(split_grid(grid, header_row, matched, options))
}

fn split_grid(grid: &Grid, header_row: usize, matched: bool, options: &IngestOptions) -> LocatedTable {
    let body: Vec<&Vec<CellValue>> = grid
        .rows
        .iter()
        .skip(header_row + 1)
        .filter(|row| !(options.skip_blank_rows && row.iter().all(CellValue::is_blank)))
        .collect();

    let header: &[CellValue] = grid.rows.get(header_row).map(Vec::as_slice).unwrap_or(&[]);
    let width = body.iter().map(|r| r.len()).max().unwrap_or(0);
    let columns = dedupe_labels(header_labels(header, width));

    let mut data = Dataset::new(columns);
    for row in body {
        data.push_row(row.clone());
    }

    LocatedTable {
        sheet_name: grid.name.clone(),
        header_row,
        matched,
        pre_header_text: pre_header_text(grid, header_row),
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn tokens(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_lowercase()).collect()
    }

    fn statement_grid() -> Grid {
        Grid::new(
            "Sheet1",
            vec![
                vec![text("Acme Statement"), CellValue::Null],
                vec![text("Period: Jan 2024"), text("  ")],
                vec![text("Date"), text("Invoice #"), text("Amount")],
                vec![text("2023-01-01"), text("INV1"), CellValue::Number(0.0)],
                vec![CellValue::Null, CellValue::Null, CellValue::Null],
                vec![text("2023-01-02"), text("INV2"), CellValue::Number(100.0)],
            ],
        )
    }

    #[test]
    fn test_finds_header_below_preamble() {
        let mut log = LogSink::new();
        let table = locate_header(
            &[statement_grid()],
            &tokens(&["date", "invoice #", "amount"]),
            &IngestOptions::default(),
            &mut log,
        )
        .unwrap();

        assert!(table.matched);
        assert_eq!(table.header_row, 2);
        assert_eq!(table.pre_header_text, "Acme Statement Period: Jan 2024");
        assert_eq!(table.data.columns(), &["Date".to_string(), "Invoice #".to_string(), "Amount".to_string()]);
        assert_eq!(table.data.row_count(), 2);
    }

    #[test]
    fn test_substring_match_and_numbers_ignored() {
        let row = vec![text("Transaction Date"), text("Total Amount"), CellValue::Number(5.0), text("Ref")];
        assert_eq!(count_matches(&row, &tokens(&["date", "amount", "5"])), 2);
    }

    #[test]
    fn test_fallback_to_row_zero() {
        let mut log = LogSink::new();
        let table = locate_header(
            &[statement_grid()],
            &tokens(&["nothing", "matches"]),
            &IngestOptions::default(),
            &mut log,
        )
        .unwrap();

        assert!(!table.matched);
        assert_eq!(table.header_row, 0);
        assert_eq!(table.pre_header_text, "");
        assert_eq!(table.data.columns()[0], "Acme Statement");
        assert_eq!(table.data.columns()[1], "Unnamed: 1");
        assert!(log.entries()[0].message.contains("using row 0"));
    }

    #[test]
    fn test_sheet_with_headers_wins() {
        let cover = Grid::new("Cover", vec![vec![text("Quarterly pack")]]);
        let blank = Grid::new("Blank", vec![vec![CellValue::Null]]);
        let mut log = LogSink::new();
        let table = locate_header(
            &[blank, cover, statement_grid()],
            &tokens(&["date", "invoice", "amount"]),
            &IngestOptions::default(),
            &mut log,
        )
        .unwrap();
        assert_eq!(table.sheet_name, "Sheet1");

        let cover = Grid::new("Cover", vec![vec![text("Quarterly pack")]]);
        let table = locate_header(&[cover], &tokens(&["date"]), &IngestOptions::default(), &mut log).unwrap();
        assert_eq!(table.sheet_name, "Cover");
    }

    #[test]
    fn test_no_valid_sheets() {
        let mut log = LogSink::new();
        let empty = Grid::new("Empty", vec![]);
        assert!(locate_header(&[empty], &[], &IngestOptions::default(), &mut log).is_none());
        assert_eq!(log.entries()[0].message, "No valid sheets found");
    }

    #[test]
    fn test_detection_is_idempotent() {
        let grid = statement_grid();
        let toks = tokens(&["date", "invoice #", "amount"]);
        let opts = IngestOptions::default();

        let first = locate_header(std::slice::from_ref(&grid), &toks, &opts, &mut LogSink::new()).unwrap();
        let second = locate_header(std::slice::from_ref(&grid), &toks, &opts, &mut LogSink::new()).unwrap();
        assert_eq!(first.header_row, second.header_row);
        assert_eq!(first.pre_header_text, second.pre_header_text);
        assert_eq!(first, second);
    }

    #[test]
    fn test_body_wider_than_header() {
        let grid = Grid::new(
            "s",
            vec![
                vec![text("a")],
                vec![CellValue::Number(1.0), CellValue::Number(2.0)],
            ],
        );
        let table = locate_header(&[grid], &[], &IngestOptions::default(), &mut LogSink::new()).unwrap();
        assert_eq!(table.data.columns(), &["a".to_string(), "Unnamed: 1".to_string()]);
        assert_eq!(table.data.rows()[0][1], CellValue::Number(2.0));
    }
}
