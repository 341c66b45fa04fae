//! Domain models shared by every pipeline stage.
//!
//! - [`CellValue`] - tagged cell variant (null, number, text, date)
//! - [`Grid`] - positional rows read from one sheet or CSV file
//! - [`Dataset`] - named columns plus rows, threaded through the pipeline

use chrono::{NaiveDateTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashSet;

static NULL_CELL: CellValue = CellValue::Null;

static DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)$").expect("valid decimal regex"));

/// Parse a plain signed decimal (`-12`, `3.50`, `.5`).
///
/// Exponents, thousands separators and the `inf`/`nan` spellings accepted by
/// `f64::from_str` are rejected.
pub fn parse_decimal(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if !DECIMAL.is_match(trimmed) {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Render a number without a trailing `.0` when it is integral.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

// =============================================================================
// Cell values
// =============================================================================

/// One untyped cell, made explicit.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Null,
    Number(f64),
    Text(String),
    Date(NaiveDateTime),
}

impl CellValue {
    /// Classify raw text: blank → `Null`, decimal → `Number`, else `Text`.
    pub fn infer(raw: &str) -> Self {
        if raw.trim().is_empty() {
            CellValue::Null
        } else if let Some(n) = parse_decimal(raw) {
            CellValue::Number(n)
        } else {
            CellValue::Text(raw.to_string())
        }
    }

    /// Convert a scalar JSON value from a provider schema.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => CellValue::Null,
            Value::Bool(b) => CellValue::Text(b.to_string()),
            Value::Number(n) => n.as_f64().map(CellValue::Number).unwrap_or(CellValue::Null),
            Value::String(s) => CellValue::Text(s.clone()),
            other => CellValue::Text(other.to_string()),
        }
    }

    /// Null, or text that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric view of the cell. Text is parsed as a plain decimal.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => parse_decimal(s),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Textual rendering used for comparisons and concatenation.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Text(s) => s.clone(),
            CellValue::Date(d) => format_date(d),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Null => Value::Null,
            CellValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            CellValue::Text(s) => Value::String(s.clone()),
            CellValue::Date(d) => Value::String(format_date(d)),
        }
    }
}

fn format_date(d: &NaiveDateTime) -> String {
    if d.hour() == 0 && d.minute() == 0 && d.second() == 0 {
        d.format("%Y-%m-%d").to_string()
    } else {
        d.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Null => serializer.serialize_none(),
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Date(d) => serializer.serialize_str(&format_date(d)),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

// =============================================================================
// Grid
// =============================================================================

/// Positional rows of one sheet (or one CSV file). Rows may be jagged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    /// Sheet name, or the file stem for CSV input
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

impl Grid {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { name: name.into(), rows }
    }

    /// True when there are no rows or every cell is blank.
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.iter().all(CellValue::is_blank))
    }
}

// =============================================================================
// Dataset
// =============================================================================

/// Named columns (unique, insertion ordered) and rows aligned to them.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    /// Build from columns and rows; short rows are padded with `Null`.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let mut dataset = Self::new(columns);
        for row in rows {
            dataset.push_row(row);
        }
        dataset
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// No rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Null);
        self.rows.push(row);
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Case-insensitive column lookup.
    pub fn find_column(&self, name: &str) -> Option<usize> {
        let wanted = name.to_lowercase();
        self.columns.iter().position(|c| c.to_lowercase() == wanted)
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &CellValue> + '_ {
        self.rows.iter().map(move |r| r.get(idx).unwrap_or(&NULL_CELL))
    }

    /// Add a column, or replace its values if it already exists.
    pub fn set_column(&mut self, name: &str, values: Vec<CellValue>) {
        let idx = match self.column_index(name) {
            Some(idx) => idx,
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.push(CellValue::Null);
                }
                self.columns.len() - 1
            }
        };
        for (row, value) in self.rows.iter_mut().zip(values) {
            row[idx] = value;
        }
    }

    /// Assign the same value to every row.
    pub fn fill_column(&mut self, name: &str, value: CellValue) {
        let values = vec![value; self.rows.len()];
        self.set_column(name, values);
    }

    pub fn rename_column(&mut self, idx: usize, name: impl Into<String>) {
        if let Some(col) = self.columns.get_mut(idx) {
            *col = name.into();
        }
    }

    /// Lower-case every column name; collisions get a `_N` suffix.
    pub fn lowercase_columns(&mut self) {
        let mut seen: HashSet<String> = HashSet::new();
        for col in &mut self.columns {
            let lower = col.to_lowercase();
            let mut name = lower.clone();
            let mut count = 1;
            while seen.contains(&name) {
                name = format!("{}_{}", lower, count);
                count += 1;
            }
            seen.insert(name.clone());
            *col = name;
        }
    }

    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[CellValue]) -> bool,
    {
        self.rows.retain(|row| keep(row));
    }

    /// Remove columns whose every cell is blank; returns their names.
    pub fn drop_blank_columns(&mut self) -> Vec<String> {
        let keep: Vec<bool> = (0..self.columns.len())
            .map(|idx| !self.column_values(idx).all(CellValue::is_blank))
            .collect();

        let dropped: Vec<String> = self
            .columns
            .iter()
            .zip(&keep)
            .filter(|(_, k)| !**k)
            .map(|(c, _)| c.clone())
            .collect();

        if dropped.is_empty() {
            return dropped;
        }

        self.columns = self
            .columns
            .drain(..)
            .zip(&keep)
            .filter(|(_, k)| **k)
            .map(|(c, _)| c)
            .collect();
        for row in &mut self.rows {
            *row = row
                .drain(..)
                .zip(&keep)
                .filter(|(_, k)| **k)
                .map(|(v, _)| v)
                .collect();
        }
        dropped
    }

    /// Concatenate another dataset below this one.
    ///
    /// Columns are unioned in first-seen order; cells absent on either side
    /// become `Null`.
    pub fn append(&mut self, other: Dataset) {
        let positions: Vec<usize> = other
            .columns
            .iter()
            .map(|name| match self.column_index(name) {
                Some(idx) => idx,
                None => {
                    self.columns.push(name.clone());
                    for row in &mut self.rows {
                        row.push(CellValue::Null);
                    }
                    self.columns.len() - 1
                }
            })
            .collect();

        let width = self.columns.len();
        for row in other.rows {
            let mut aligned = vec![CellValue::Null; width];
            for (value, &pos) in row.into_iter().zip(&positions) {
                aligned[pos] = value;
            }
            self.rows.push(aligned);
        }
    }

    /// Rows as JSON objects keyed by column name.
    pub fn to_records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let obj: Map<String, Value> = self
                    .columns
                    .iter()
                    .zip(row)
                    .map(|(c, v)| (c.clone(), v.to_json()))
                    .collect();
                Value::Object(obj)
            })
            .collect()
    }
}
