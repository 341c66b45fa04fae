//! Calculation expression language.
//!
//! Expressions reference columns as `[field]` and combine them with
//! `+ - * /` (numeric) or `&` (text concatenation). Any `&` switches the
//! whole expression to text mode, which changes how field values are
//! substituted (see [`eval::substitute`]).
//!
//! ```text
//! source ──▶ lexer ──▶ tokens ──▶ parser ──▶ Expr ──▶ eval(row) ──▶ CellValue
//! ```

pub mod eval;
pub mod lexer;
pub mod parser;

use crate::error::ExpressionResult;
use crate::models::CellValue;

pub use lexer::Token;
pub use parser::{BinOp, Expr};

/// A parsed, reusable calculation expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    ast: Expr,
    text_mode: bool,
    fields: Vec<String>,
}

impl Expression {
    pub fn parse(source: &str) -> ExpressionResult<Self> {
        let tokens = lexer::tokenize(source)?;
        let text_mode = tokens.contains(&Token::Amp);
        let ast = parser::parse(&tokens)?;

        let mut fields = Vec::new();
        collect_fields(&ast, &mut fields);

        Ok(Self {
            source: source.to_string(),
            ast,
            text_mode,
            fields,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// True when the expression concatenates text.
    pub fn is_text(&self) -> bool {
        self.text_mode
    }

    /// Referenced fields, lower-cased, in first-seen order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Evaluate against one row. `lookup` resolves lower-cased field names.
    pub fn evaluate<'a, F>(&self, lookup: F) -> ExpressionResult<CellValue>
    where
        F: Fn(&str) -> Option<&'a CellValue>,
    {
        eval::evaluate(&self.ast, self.text_mode, &lookup)
    }
}

fn collect_fields(expr: &Expr, out: &mut Vec<String>) {
    match expr {
        Expr::Field(name) => {
            if !out.contains(name) {
                out.push(name.clone());
            }
        }
        Expr::Neg(inner) => collect_fields(inner, out),
        Expr::Binary { left, right, .. } => {
            collect_fields(left, out);
            collect_fields(right, out);
        }
        Expr::Number(_) | Expr::Text(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn eval_with(src: &str, row: &[(&str, CellValue)]) -> ExpressionResult<CellValue> {
        let values: HashMap<String, CellValue> =
            row.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        Expression::parse(src)?.evaluate(|name| values.get(name))
    }

    #[test]
    fn test_fields_and_mode() {
        let expr = Expression::parse("[Net] + [GST] - [net]").unwrap();
        assert_eq!(expr.fields(), &["net".to_string(), "gst".to_string()]);
        assert!(!expr.is_text());
        assert!(Expression::parse("[a] & '-' & [b]").unwrap().is_text());
    }

    #[test]
    fn test_arithmetic() {
        let out = eval_with("([amount] * 0.15)", &[("amount", CellValue::Number(100.0))]).unwrap();
        assert_eq!(out, CellValue::Number(15.0));

        let out = eval_with("-[a] + 2 * (3 - 1)", &[("a", CellValue::Text("1.5".into()))]).unwrap();
        assert_eq!(out, CellValue::Number(2.5));

        let out = eval_with("[a] + 1", &[("a", CellValue::Null)]).unwrap();
        assert_eq!(out, CellValue::Number(1.0));
    }

    #[test]
    fn test_text_concatenation() {
        let row = [
            ("code", CellValue::Text("INV".into())),
            ("num", CellValue::Number(7.0)),
            ("blank", CellValue::Null),
        ];
        let out = eval_with("[code] & \"-\" & [num] & [blank]", &row).unwrap();
        assert_eq!(out, CellValue::Text("INV-7".into()));
    }

    #[test]
    fn test_row_errors() {
        assert!(eval_with("[a] / 0", &[("a", CellValue::Number(1.0))]).is_err());
        assert!(eval_with("[a] + 'x'", &[("a", CellValue::Number(1.0))]).is_err());
        assert!(eval_with("[missing] + 1", &[]).is_err());
    }
}
