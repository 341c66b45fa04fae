//! Column Normalizer: header labels, deduplication, empty-column removal.

use std::collections::HashSet;

use crate::logs::LogSink;
use crate::models::{CellValue, Dataset};

const STEP: &str = "Normalize Columns";
const SOURCE: &str = "ColumnNormalizer";

/// Turn header cells into trimmed labels, padded to `width`.
///
/// Blank cells become `Unnamed: <index>`.
pub fn header_labels(header: &[CellValue], width: usize) -> Vec<String> {
    (0..width.max(header.len()))
        .map(|idx| match header.get(idx) {
            Some(cell) if !cell.is_blank() => cell.to_text().trim().to_string(),
            _ => format!("Unnamed: {}", idx),
        })
        .collect()
}

/// Make labels unique: repeats get the smallest free `_N` suffix.
pub fn dedupe_labels(labels: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut unique = Vec::with_capacity(labels.len());

    for label in labels {
        let label = label.trim().to_string();
        let name = if seen.contains(&label) {
            let mut count = 1;
            while seen.contains(&format!("{}_{}", label, count)) {
                count += 1;
            }
            format!("{}_{}", label, count)
        } else {
            label
        };
        seen.insert(name.clone());
        unique.push(name);
    }

    unique
}

/// Drop columns that are blank in every body row.
///
/// A header-only table keeps its columns.
pub fn drop_empty_columns(data: &mut Dataset, log: &mut LogSink) {
    if data.row_count() == 0 {
        return;
    }
    let dropped = data.drop_blank_columns();
    if !dropped.is_empty() {
        log.info(
            STEP,
            SOURCE,
            format!("Dropped empty columns: {}", dropped.join(", ")),
            "Success",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_dedupe_appends_suffixes() {
        let out = dedupe_labels(labels(&["Amount", " Amount ", "Date", "Amount"]));
        assert_eq!(out, labels(&["Amount", "Amount_1", "Date", "Amount_2"]));
    }

    #[test]
    fn test_dedupe_skips_taken_suffix() {
        let out = dedupe_labels(labels(&["a", "a_1", "a"]));
        assert_eq!(out, labels(&["a", "a_1", "a_2"]));

        let out = dedupe_labels(labels(&["a", "a", "a_1"]));
        assert_eq!(out, labels(&["a", "a_1", "a_1_1"]));
    }

    #[test]
    fn test_header_labels_name_blank_cells() {
        let header = vec![
            CellValue::Text(" Date ".into()),
            CellValue::Null,
            CellValue::Number(2024.0),
        ];
        assert_eq!(header_labels(&header, 4), labels(&["Date", "Unnamed: 1", "2024", "Unnamed: 3"]));
    }

    #[test]
    fn test_drop_empty_columns_logs_names() {
        let mut data = Dataset::from_rows(
            labels(&["a", "Unnamed: 1"]),
            vec![vec![CellValue::Number(1.0), CellValue::Null]],
        );
        let mut log = LogSink::new();
        drop_empty_columns(&mut data, &mut log);

        assert_eq!(data.columns(), &["a".to_string()]);
        assert_eq!(log.entries()[0].action_detail, "Dropped empty columns: Unnamed: 1");
    }

    #[test]
    fn test_header_only_table_keeps_columns() {
        let mut data = Dataset::new(labels(&["a", "b"]));
        let mut log = LogSink::new();
        drop_empty_columns(&mut data, &mut log);
        assert_eq!(data.columns().len(), 2);
        assert!(log.is_empty());
    }
}
