//! Grid ingestion for CSV files and spreadsheets.
//!
//! Reads a file into positional [`Grid`]s with no header assumption: the
//! header row is found later by [`crate::ingest::header`]. CSV input gets
//! encoding and delimiter auto-detection; workbooks yield one grid per sheet.

pub mod workbook;

use csv::ReaderBuilder;
use encoding_rs::Encoding;
use std::path::Path;

use crate::config::IngestOptions;
use crate::error::{IngestError, IngestResult};
use crate::models::{CellValue, Grid};

/// Reader selected from a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Workbook,
}

impl FileKind {
    /// Resolve an extension such as `.csv`, `xlsx` or `.XLS`.
    pub fn from_extension(extension: &str) -> IngestResult<Self> {
        let ext = extension.trim().trim_start_matches('.').to_lowercase();
        match ext.as_str() {
            "csv" => Ok(FileKind::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(FileKind::Workbook),
            _ => Err(IngestError::UnsupportedFormat(format!(".{}", ext))),
        }
    }
}

/// Lower-cased extension including the dot, or empty.
pub fn file_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
///
/// Any WHATWG label is accepted (`ISO-8859-2`, `UTF-16LE`, `Shift_JIS`, ...);
/// unknown labels fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let label = match encoding.trim().to_lowercase().as_str() {
        "latin-1" => "latin1".to_string(),
        other => other.to_string(),
    };
    let decoded = match Encoding::for_label(label.as_bytes()) {
        Some(enc) => enc.decode(bytes).0.into_owned(),
        None => String::from_utf8_lossy(bytes).into_owned(),
    };

    match decoded.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => decoded,
    }
}

/// Detect the delimiter by counting candidates over the leading lines.
///
/// Pre-header text often has no delimiter at all, so several lines are
/// inspected instead of just the first.
pub fn detect_delimiter(content: &str, max_lines: usize) -> char {
    let separators = [',', ';', '\t', '|'];
    let mut counts = [0usize; 4];

    for line in content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(max_lines.max(1))
    {
        for (i, sep) in separators.iter().enumerate() {
            counts[i] += line.matches(*sep).count();
        }
    }

    let mut best_sep = ',';
    let mut best_count = 0;
    for (sep, count) in separators.iter().zip(counts) {
        if count > best_count {
            best_count = count;
            best_sep = *sep;
        }
    }

    best_sep
}

/// Parse CSV text into a grid with an explicit delimiter.
pub fn parse_csv_grid(content: &str, delimiter: char, name: &str) -> IngestResult<Grid> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter as u8)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(CellValue::infer).collect());
    }

    Ok(Grid::new(name, rows))
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_csv_bytes(bytes: &[u8], name: &str, options: &IngestOptions) -> IngestResult<Grid> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content, options.max_delimiter_scan_lines);
    tracing::debug!(%encoding, delimiter = %delimiter.escape_default(), "decoded csv input");

    parse_csv_grid(&content, delimiter, name)
}

/// Read a file into one grid per sheet (a single grid for CSV).
pub fn read_grids(path: &Path, options: &IngestOptions) -> IngestResult<Vec<Grid>> {
    let kind = FileKind::from_extension(&file_extension(path))?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("data");

    match kind {
        FileKind::Csv => {
            let bytes = std::fs::read(path)?;
            Ok(vec![parse_csv_bytes(&bytes, name, options)?])
        }
        FileKind::Workbook => workbook::read_workbook(path),
    }
}

/// Same as [`read_grids`] for an in-memory upload.
pub fn read_grids_from_bytes(
    bytes: &[u8],
    extension: &str,
    name: &str,
    options: &IngestOptions,
) -> IngestResult<Vec<Grid>> {
    match FileKind::from_extension(extension)? {
        FileKind::Csv => Ok(vec![parse_csv_bytes(bytes, name, options)?]),
        FileKind::Workbook => workbook::read_workbook_bytes(bytes.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_file_kind() {
        assert_eq!(FileKind::from_extension(".CSV").unwrap(), FileKind::Csv);
        assert_eq!(FileKind::from_extension("xlsx").unwrap(), FileKind::Workbook);
        assert!(matches!(
            FileKind::from_extension(".txt"),
            Err(IngestError::UnsupportedFormat(ext)) if ext == ".txt"
        ));
    }

    #[test]
    fn test_detect_delimiter_skips_preamble() {
        let content = "Statement for Acme\nPeriod: Jan\nDate;Ref;Amount\n2024-01-01;A;5";
        assert_eq!(detect_delimiter(content, 20), ';');
    }

    #[test]
    fn test_detect_delimiter_tab_and_pipe() {
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3", 20), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3", 20), '|');
        assert_eq!(detect_delimiter("no delimiters here", 20), ',');
    }

    #[test]
    fn test_parse_csv_grid_is_positional_and_jagged() {
        let csv = "Report title\nDate,Invoice #,Amount\n2023-01-01,INV1,100\n2023-01-02,\"INV, 2\",\n";
        let grid = parse_csv_grid(csv, ',', "report").unwrap();

        assert_eq!(grid.name, "report");
        assert_eq!(grid.rows.len(), 4);
        assert_eq!(grid.rows[0], vec![text("Report title")]);
        assert_eq!(grid.rows[1][1], text("Invoice #"));
        assert_eq!(grid.rows[2][2], CellValue::Number(100.0));
        assert_eq!(grid.rows[3][1], text("INV, 2"));
        assert_eq!(grid.rows[3][2], CellValue::Null);
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_other_charsets_use_their_decoder() {
        // "Łódź" in ISO-8859-2
        let bytes: &[u8] = &[0xA3, 0xF3, 0x64, 0xBC];
        assert_eq!(decode_content(bytes, "ISO-8859-2"), "Łódź");

        // "a,b" in UTF-16LE with BOM
        let utf16: &[u8] = &[0xFF, 0xFE, 0x61, 0x00, 0x2C, 0x00, 0x62, 0x00];
        assert_eq!(decode_content(utf16, "UTF-16LE"), "a,b");

        assert_eq!(decode_content(b"plain", "no-such-charset"), "plain");
    }

    #[test]
    fn test_bom_is_stripped() {
        let bytes = "\u{feff}a,b\n1,2".as_bytes();
        let grid = parse_csv_bytes(bytes, "bom", &IngestOptions::default()).unwrap();
        assert_eq!(grid.rows[0][0], text("a"));
    }

    #[test]
    fn test_read_grids_from_bytes_rejects_unknown_extension() {
        let result = read_grids_from_bytes(b"hello", ".txt", "notes", &IngestOptions::default());
        assert!(matches!(result, Err(IngestError::UnsupportedFormat(_))));
    }
}
