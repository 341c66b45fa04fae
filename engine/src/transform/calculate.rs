//! Calculation Engine: derived columns from expressions.
//!
//! Calculations run in list order, so a field created by one calculation
//! can be referenced by the next. A row that fails to evaluate gets `Null`;
//! an expression that fails to parse, or names an unknown column, is logged
//! and skipped.

use std::collections::HashMap;

use super::expr::Expression;
use crate::error::{ExpressionError, ExpressionResult};
use crate::logs::LogSink;
use crate::models::{CellValue, Dataset};
use crate::schema::Calculation;

const STEP: &str = "Apply Calculations";
const SOURCE: &str = "CalculationEngine";

/// Numeric columns stay numeric only if every non-null cell is a number.
///
/// Otherwise every non-null cell is rendered as text.
pub fn coerce_numeric(values: Vec<CellValue>) -> Vec<CellValue> {
    let numeric = values
        .iter()
        .all(|v| matches!(v, CellValue::Null) || v.as_number().is_some());

    values
        .into_iter()
        .map(|v| match v {
            CellValue::Null => CellValue::Null,
            other if numeric => other.as_number().map(CellValue::Number).unwrap_or(CellValue::Null),
            other => CellValue::Text(other.to_text()),
        })
        .collect()
}

/// Evaluate one expression for every row.
///
/// Returns the column values and how many rows failed.
pub fn evaluate_column(data: &Dataset, expr: &Expression) -> ExpressionResult<(Vec<CellValue>, usize)> {
    let mut bindings: HashMap<&str, usize> = HashMap::new();
    for field in expr.fields() {
        let idx = data
            .find_column(field)
            .ok_or_else(|| ExpressionError::UnknownColumn(field.clone()))?;
        bindings.insert(field.as_str(), idx);
    }

    let mut failed = 0;
    let values = data
        .rows()
        .iter()
        .enumerate()
        .map(|(row_idx, row)| {
            match expr.evaluate(|name| bindings.get(name).and_then(|&i| row.get(i))) {
                Ok(value) => value,
                Err(err) => {
                    tracing::debug!(row = row_idx, expression = expr.source(), "row evaluation failed: {}", err);
                    failed += 1;
                    CellValue::Null
                }
            }
        })
        .collect();

    Ok((values, failed))
}

pub fn apply_calculations(mut data: Dataset, calculations: &[Calculation], log: &mut LogSink) -> Dataset {
    if data.is_empty() || calculations.is_empty() {
        log.info(STEP, SOURCE, "No data or calculations", "No changes made");
        return data;
    }

    data.lowercase_columns();

    for calc in calculations {
        let field = calc.new_field.trim().to_lowercase();
        let source = calc.expression.trim();

        if field.is_empty() || source.is_empty() {
            log.warning(
                STEP,
                SOURCE,
                format!("Invalid calculation: {} = {}", field, source),
                "Missing field name or expression",
            );
            continue;
        }

        let result = Expression::parse(source).and_then(|expr| {
            let (values, failed) = evaluate_column(&data, &expr)?;
            Ok((expr, values, failed))
        });

        match result {
            Ok((expr, values, failed)) => {
                let values = if expr.is_text() { values } else { coerce_numeric(values) };
                data.set_column(&field, values);

                let mut detail = format!("Added column: {} = {}", field, source);
                if failed > 0 {
                    detail.push_str(&format!("; Null rows: {}", failed));
                }
                log.success(STEP, SOURCE, detail, "Success");
            }
            Err(err) => {
                log.error(
                    STEP,
                    SOURCE,
                    format!("Error adding column {} = {}", field, source),
                    err.to_string(),
                );
            }
        }
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc(field: &str, expression: &str) -> Calculation {
        Calculation {
            new_field: field.to_string(),
            expression: expression.to_string(),
        }
    }

    fn data(columns: &[&str], rows: Vec<Vec<CellValue>>) -> Dataset {
        Dataset::from_rows(columns.iter().map(|s| s.to_string()).collect(), rows)
    }

    #[test]
    fn test_later_calculations_see_earlier_fields() {
        let ds = data(&["X"], vec![vec![CellValue::Number(3.0)]]);
        let calcs = vec![calc("a", "[x]+1"), calc("B", "[a]*2")];
        let out = apply_calculations(ds, &calcs, &mut LogSink::new());

        assert_eq!(out.cell(0, "a"), Some(&CellValue::Number(4.0)));
        assert_eq!(out.cell(0, "b"), Some(&CellValue::Number(8.0)));
    }

    #[test]
    fn test_row_failures_become_null() {
        let ds = data(
            &["amount", "qty"],
            vec![
                vec![CellValue::Number(10.0), CellValue::Number(2.0)],
                vec![CellValue::Number(10.0), CellValue::Number(0.0)],
            ],
        );
        let mut log = LogSink::new();
        let out = apply_calculations(ds, &[calc("unit", "[amount] / [qty]")], &mut log);

        assert_eq!(out.cell(0, "unit"), Some(&CellValue::Number(5.0)));
        assert_eq!(out.cell(1, "unit"), Some(&CellValue::Null));
        assert_eq!(log.entries()[0].action_detail, "Added column: unit = [amount] / [qty]; Null rows: 1");
    }

    #[test]
    fn test_unknown_field_skips_calculation() {
        let ds = data(&["amount"], vec![vec![CellValue::Number(1.0)]]);
        let mut log = LogSink::new();
        let out = apply_calculations(ds, &[calc("x", "[nope] + 1"), calc("", "1")], &mut log);

        assert_eq!(out.columns(), &["amount".to_string()]);
        assert_eq!(log.entries()[0].message, "Column 'nope' not found");
        assert_eq!(log.entries()[1].message, "Missing field name or expression");
    }

    #[test]
    fn test_text_concatenation_column() {
        let ds = data(
            &["Code", "Num"],
            vec![vec![CellValue::Text("INV".into()), CellValue::Number(1.0)]],
        );
        let out = apply_calculations(ds, &[calc("ref", "[code] & '-' & [num]")], &mut LogSink::new());
        assert_eq!(out.cell(0, "ref"), Some(&CellValue::Text("INV-1".into())));
    }

    #[test]
    fn test_one_text_cell_forces_text_column() {
        let values = vec![CellValue::Number(1.0), CellValue::Text("x".into()), CellValue::Null];
        assert_eq!(
            coerce_numeric(values),
            vec![CellValue::Text("1".into()), CellValue::Text("x".into()), CellValue::Null]
        );

        let values = vec![CellValue::Text("2.5".into()), CellValue::Null];
        assert_eq!(coerce_numeric(values), vec![CellValue::Number(2.5), CellValue::Null]);
    }

    #[test]
    fn test_parse_error_is_logged() {
        let ds = data(&["a"], vec![vec![CellValue::Number(1.0)]]);
        let mut log = LogSink::new();
        apply_calculations(ds, &[calc("b", "[a] +")], &mut log);
        assert_eq!(log.entries()[0].action_detail, "Error adding column b = [a] +");
    }
}
