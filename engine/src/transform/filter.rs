//! Filter Engine
//!
//! Each filter has the shape `[field] <op> <value>` and removes the rows that
//! fail it. Filters run in order against the output of the previous one; a
//! malformed filter is logged and skipped without touching the rows.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ExpressionError, ExpressionResult};
use crate::logs::LogSink;
use crate::models::{parse_decimal, CellValue, Dataset};

const STEP: &str = "Apply Filters";
const SOURCE: &str = "FilterEngine";

static COLUMN_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(.*?)\]").expect("valid column reference regex"));

/// Values that mean "null or empty" on the right-hand side.
const NULL_LITERALS: [&str; 4] = ["null", "blank()", "\"\"", "''"];

/// Comparison operator. Multi-character operators are listed first so that
/// `<` never matches inside `<>` or `<=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Ne,
    Ge,
    Le,
    Eq,
    Gt,
    Lt,
}

impl CompareOp {
    pub const ALL: [CompareOp; 6] = [
        CompareOp::Ne,
        CompareOp::Ge,
        CompareOp::Le,
        CompareOp::Eq,
        CompareOp::Gt,
        CompareOp::Lt,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Ne => "<>",
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
            CompareOp::Eq => "=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
        }
    }

    fn is_equality(&self) -> bool {
        matches!(self, CompareOp::Eq | CompareOp::Ne)
    }

    fn compare(&self, left: f64, right: f64) -> bool {
        match self {
            CompareOp::Ne => left != right,
            CompareOp::Ge => left >= right,
            CompareOp::Le => left <= right,
            CompareOp::Eq => left == right,
            CompareOp::Gt => left > right,
            CompareOp::Lt => left < right,
        }
    }
}

/// Right-hand side of a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Null or empty test
    Null,
    Number(f64),
    /// Lower-cased, quotes stripped
    Text(String),
}

/// A parsed filter expression.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpr {
    /// Lower-cased column name
    pub column: String,
    pub op: CompareOp,
    pub value: FilterValue,
}

/// Extract the lower-cased column name and the text after its `]`.
pub fn column_ref(condition: &str) -> ExpressionResult<(String, &str)> {
    let caps = COLUMN_REF
        .captures(condition)
        .ok_or(ExpressionError::MissingColumnRef)?;
    let whole = caps.get(0).ok_or(ExpressionError::MissingColumnRef)?;
    let name = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    Ok((name.trim().to_lowercase(), &condition[whole.end()..]))
}

impl FilterExpr {
    pub fn parse(condition: &str) -> ExpressionResult<Self> {
        let (column, rest) = column_ref(condition.trim())?;

        let (op, raw) = CompareOp::ALL
            .iter()
            .find_map(|op| rest.split_once(op.symbol()).map(|(_, value)| (*op, value.trim())))
            .ok_or(ExpressionError::MissingOperator)?;
        if raw.is_empty() {
            return Err(ExpressionError::MissingOperator);
        }

        let value = if NULL_LITERALS.contains(&raw.to_lowercase().as_str()) {
            FilterValue::Null
        } else if let Some(n) = parse_decimal(raw) {
            FilterValue::Number(n)
        } else {
            FilterValue::Text(raw.trim_matches(|c| c == '"' || c == '\'').to_lowercase())
        };

        if !op.is_equality() && !matches!(value, FilterValue::Number(_)) {
            return Err(ExpressionError::TextOrdering {
                op: op.symbol().to_string(),
                value: raw.to_string(),
            });
        }

        Ok(Self { column, op, value })
    }

    /// Whether a cell passes the filter.
    pub fn matches(&self, cell: &CellValue) -> bool {
        match &self.value {
            FilterValue::Null => match self.op {
                CompareOp::Eq => cell.is_blank(),
                _ => !cell.is_blank(),
            },
            // Unparseable cells behave like NaN
            FilterValue::Number(n) => match cell.as_number() {
                Some(v) => self.op.compare(v, *n),
                None => self.op == CompareOp::Ne,
            },
            FilterValue::Text(text) => {
                let equal = cell.to_text().to_lowercase() == *text;
                match self.op {
                    CompareOp::Eq => equal,
                    _ => !equal,
                }
            }
        }
    }
}

/// Outcome of one filter.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub filter: String,
    pub status: String,
    pub rows_removed: usize,
}

/// Apply one filter in place. Column names must already be lower-cased.
pub fn apply_filter(data: &mut Dataset, condition: &str) -> FilterOutcome {
    let filter = condition.trim().to_string();
    let outcome = |status: String, rows_removed: usize| FilterOutcome {
        filter: filter.clone(),
        status,
        rows_removed,
    };

    let column = match column_ref(&filter) {
        Ok((column, _)) => column,
        Err(err) => return outcome(err.to_string(), 0),
    };
    let Some(idx) = data.column_index(&column) else {
        return outcome(ExpressionError::UnknownColumn(column).to_string(), 0);
    };

    let expr = match FilterExpr::parse(&filter) {
        Ok(expr) => expr,
        Err(err @ ExpressionError::MissingOperator) => return outcome(err.to_string(), 0),
        Err(err) => return outcome(format!("Error: {}", err), 0),
    };

    let before = data.row_count();
    data.retain_rows(|row| row.get(idx).map_or(false, |cell| expr.matches(cell)));
    outcome("Applied".to_string(), before - data.row_count())
}

/// Apply every filter in order, logging each and a summary.
pub fn apply_filters(mut data: Dataset, filters: &[String], log: &mut LogSink) -> Dataset {
    if data.is_empty() || filters.is_empty() {
        log.info(STEP, SOURCE, "No data or filters", "No changes made");
        return data;
    }

    data.lowercase_columns();
    let original = data.row_count();

    for condition in filters {
        let result = apply_filter(&mut data, condition);
        let detail = format!("Filter: {}; Rows removed: {}", result.filter, result.rows_removed);
        if result.status == "Applied" {
            log.success(STEP, SOURCE, detail, result.status);
        } else {
            log.warning(STEP, SOURCE, detail, result.status);
        }
    }

    let remaining = data.row_count();
    log.info(
        "Apply Filters Summary",
        SOURCE,
        format!(
            "Original rows: {}; Final rows: {}; Total removed: {}",
            original,
            remaining,
            original - remaining
        ),
        "Completed",
    );

    data
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn amounts() -> Dataset {
        Dataset::from_rows(
            vec!["Amount".into(), "Status".into()],
            vec![
                vec![CellValue::Number(0.0), text("Paid")],
                vec![CellValue::Number(100.0), text("open")],
                vec![text("n/a"), CellValue::Null],
                vec![text("-5.5"), text("")],
            ],
        )
    }

    fn run(filters: &[&str]) -> (Dataset, LogSink) {
        let mut log = LogSink::new();
        let filters: Vec<String> = filters.iter().map(|s| s.to_string()).collect();
        let out = apply_filters(amounts(), &filters, &mut log);
        (out, log)
    }

    #[test]
    fn test_parse_prefers_multi_char_operators() {
        assert_eq!(FilterExpr::parse("[a] <> 0").unwrap().op, CompareOp::Ne);
        assert_eq!(FilterExpr::parse("[a] <= 1").unwrap().op, CompareOp::Le);
        assert_eq!(FilterExpr::parse("[a] >= 1").unwrap().op, CompareOp::Ge);
        assert_eq!(FilterExpr::parse("[a] < 1").unwrap().op, CompareOp::Lt);

        let expr = FilterExpr::parse("[Status] = 'Paid'").unwrap();
        assert_eq!(expr.column, "status");
        assert_eq!(expr.value, FilterValue::Text("paid".into()));
        assert_eq!(FilterExpr::parse("[x] = BLANK()").unwrap().value, FilterValue::Null);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(FilterExpr::parse("amount <> 0"), Err(ExpressionError::MissingColumnRef));
        assert_eq!(FilterExpr::parse("[amount] 0"), Err(ExpressionError::MissingOperator));
        assert_eq!(FilterExpr::parse("[amount] = "), Err(ExpressionError::MissingOperator));
        assert!(matches!(
            FilterExpr::parse("[status] > 'abc'"),
            Err(ExpressionError::TextOrdering { .. })
        ));
    }

    #[test]
    fn test_numeric_filter_treats_unparseable_as_nan() {
        let (out, _) = run(&["[amount] > -100"]);
        assert_eq!(out.row_count(), 3);

        let (out, _) = run(&["[amount] = 100"]);
        assert_eq!(out.row_count(), 1);

        let (out, _) = run(&["[amount] <> 0"]);
        assert_eq!(out.row_count(), 3);
        assert_eq!(out.rows()[1][0], text("n/a"));
    }

    #[test]
    fn test_null_and_text_filters() {
        let (out, _) = run(&["[status] <> null"]);
        assert_eq!(out.row_count(), 2);

        let (out, _) = run(&["[status] = \"\""]);
        assert_eq!(out.row_count(), 2);

        let (out, _) = run(&["[status] = 'PAID'"]);
        assert_eq!(out.row_count(), 1);
        assert_eq!(out.columns(), &["amount".to_string(), "status".to_string()]);
    }

    #[test]
    fn test_malformed_filters_are_logged_and_skipped() {
        let (out, log) = run(&["amount <> 0", "[missing] = 1", "[amount] 5", "[status] < 'x'", "[amount] <> 0"]);
        assert_eq!(out.row_count(), 3);

        let statuses: Vec<&str> = log.entries().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(statuses[0], "Invalid filter format - missing [column]");
        assert_eq!(statuses[1], "Column 'missing' not found");
        assert_eq!(statuses[2], "Invalid filter format - missing operator or value");
        assert!(statuses[3].starts_with("Error: "));
        assert_eq!(statuses[4], "Applied");
        assert_eq!(log.entries()[4].action_detail, "Filter: [amount] <> 0; Rows removed: 1");

        let summary = log.entries().last().unwrap();
        assert_eq!(summary.step, "Apply Filters Summary");
        assert_eq!(summary.action_detail, "Original rows: 4; Final rows: 3; Total removed: 1");
    }

    #[test]
    fn test_no_filters() {
        let mut log = LogSink::new();
        let out = apply_filters(amounts(), &[], &mut log);
        assert_eq!(out.row_count(), 4);
        assert_eq!(log.entries()[0].action_detail, "No data or filters");
    }
}
