//! Row-level evaluation of a parsed expression.

use super::parser::{BinOp, Expr};
use crate::error::{ExpressionError, ExpressionResult};
use crate::models::{format_number, parse_decimal, CellValue};

/// Intermediate value during evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    fn render(&self) -> String {
        match self {
            Value::Number(n) => format_number(*n),
            Value::Text(s) => s.clone(),
        }
    }

    fn into_cell(self) -> CellValue {
        match self {
            Value::Number(n) => CellValue::Number(n),
            Value::Text(s) => CellValue::Text(s),
        }
    }
}

/// Substitute a cell for a field reference.
///
/// Numeric context: blanks and unparseable text become `0`. Text context:
/// blanks become `""`, text that parses as a number becomes that number.
pub fn substitute(cell: &CellValue, text_mode: bool) -> ExpressionResult<Value> {
    match cell {
        c if c.is_blank() => Ok(if text_mode {
            Value::Text(String::new())
        } else {
            Value::Number(0.0)
        }),
        CellValue::Number(n) => Ok(Value::Number(*n)),
        CellValue::Text(s) => match parse_decimal(s) {
            Some(n) => Ok(Value::Number(n)),
            None if text_mode => Ok(Value::Text(s.clone())),
            None => Ok(Value::Number(0.0)),
        },
        CellValue::Date(_) if text_mode => Ok(Value::Text(cell.to_text())),
        CellValue::Date(d) => Err(ExpressionError::Evaluation(format!(
            "date value {} used in arithmetic",
            d
        ))),
        CellValue::Null => Ok(Value::Number(0.0)),
    }
}

pub fn evaluate<'a, F>(expr: &Expr, text_mode: bool, lookup: &F) -> ExpressionResult<CellValue>
where
    F: Fn(&str) -> Option<&'a CellValue>,
{
    let value = eval_node(expr, text_mode, lookup)?;
    if let Value::Number(n) = value {
        if !n.is_finite() {
            return Err(ExpressionError::Evaluation("result is not a finite number".to_string()));
        }
    }
    Ok(value.into_cell())
}

fn eval_node<'a, F>(expr: &Expr, text_mode: bool, lookup: &F) -> ExpressionResult<Value>
where
    F: Fn(&str) -> Option<&'a CellValue>,
{
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Text(s) => Ok(Value::Text(s.clone())),
        Expr::Field(name) => {
            let cell = lookup(name).ok_or_else(|| ExpressionError::UnknownColumn(name.clone()))?;
            substitute(cell, text_mode)
        }
        Expr::Neg(inner) => match eval_node(inner, text_mode, lookup)? {
            Value::Number(n) => Ok(Value::Number(-n)),
            Value::Text(s) => Err(ExpressionError::Evaluation(format!("cannot negate text '{}'", s))),
        },
        Expr::Binary { op, left, right } => {
            let left = eval_node(left, text_mode, lookup)?;
            let right = eval_node(right, text_mode, lookup)?;
            apply(*op, left, right)
        }
    }
}

fn apply(op: BinOp, left: Value, right: Value) -> ExpressionResult<Value> {
    if op == BinOp::Concat {
        return Ok(Value::Text(left.render() + &right.render()));
    }

    let (a, b) = match (&left, &right) {
        (Value::Number(a), Value::Number(b)) => (*a, *b),
        _ => {
            return Err(ExpressionError::Evaluation(format!(
                "arithmetic on text ('{}', '{}')",
                left.render(),
                right.render()
            )))
        }
    };

    match op {
        BinOp::Add => Ok(Value::Number(a + b)),
        BinOp::Sub => Ok(Value::Number(a - b)),
        BinOp::Mul => Ok(Value::Number(a * b)),
        BinOp::Div if b == 0.0 => Err(ExpressionError::Evaluation("division by zero".to_string())),
        BinOp::Div => Ok(Value::Number(a / b)),
        BinOp::Concat => Ok(Value::Text(left.render() + &right.render())),
    }
}
