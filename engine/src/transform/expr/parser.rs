//! Recursive-descent parser producing the expression AST.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! concat   := additive ('&' additive)*
//! additive := term (('+' | '-') term)*
//! term     := unary (('*' | '/') unary)*
//! unary    := '-' unary | primary
//! primary  := NUMBER | STRING | FIELD | '(' concat ')'
//! ```

use super::lexer::Token;
use crate::error::{ExpressionError, ExpressionResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Concat,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Text(String),
    /// Lower-cased field name
    Field(String),
    Neg(Box<Expr>),
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

pub fn parse(tokens: &[Token]) -> ExpressionResult<Expr> {
    if tokens.is_empty() {
        return Err(ExpressionError::Syntax("empty expression".to_string()));
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.concat()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(ExpressionError::Syntax(format!(
            "unexpected '{}' at token {}",
            token.describe(),
            parser.pos
        ))),
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn concat(&mut self) -> ExpressionResult<Expr> {
        let mut left = self.additive()?;
        while let Some(Token::Amp) = self.peek() {
            self.pos += 1;
            let right = self.additive()?;
            left = Self::binary(BinOp::Concat, left, right);
        }
        Ok(left)
    }

    fn additive(&mut self) -> ExpressionResult<Expr> {
        let mut left = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let right = self.term()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn term(&mut self) -> ExpressionResult<Expr> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                _ => break,
            };
            self.pos += 1;
            let right = self.unary()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn unary(&mut self) -> ExpressionResult<Expr> {
        if let Some(Token::Minus) = self.peek() {
            self.pos += 1;
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> ExpressionResult<Expr> {
        match self.next() {
            Some(Token::Number(n)) => Ok(Expr::Number(*n)),
            Some(Token::Str(s)) => Ok(Expr::Text(s.clone())),
            Some(Token::Field(f)) => {
                if f.is_empty() {
                    return Err(ExpressionError::Syntax("empty field reference".to_string()));
                }
                Ok(Expr::Field(f.to_lowercase()))
            }
            Some(Token::LParen) => {
                let inner = self.concat()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(ExpressionError::Syntax("missing ')'".to_string())),
                }
            }
            Some(token) => Err(ExpressionError::Syntax(format!(
                "unexpected '{}'",
                token.describe()
            ))),
            None => Err(ExpressionError::Syntax("unexpected end of expression".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::lexer::tokenize;
    use super::*;

    fn parse_str(src: &str) -> ExpressionResult<Expr> {
        parse(&tokenize(src)?)
    }

    #[test]
    fn test_precedence() {
        let expr = parse_str("1 + 2 * 3").unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinOp::Add,
                left: Box::new(Expr::Number(1.0)),
                right: Box::new(Expr::Binary {
                    op: BinOp::Mul,
                    left: Box::new(Expr::Number(2.0)),
                    right: Box::new(Expr::Number(3.0)),
                }),
            }
        );
    }

    #[test]
    fn test_concat_binds_loosest() {
        let expr = parse_str("[A] & [b] + 1").unwrap();
        match expr {
            Expr::Binary { op: BinOp::Concat, left, right } => {
                assert_eq!(*left, Expr::Field("a".into()));
                assert!(matches!(*right, Expr::Binary { op: BinOp::Add, .. }));
            }
            other => panic!("unexpected ast: {:?}", other),
        }
    }

    #[test]
    fn test_syntax_errors() {
        assert!(parse_str("").is_err());
        assert!(parse_str("(1 + 2").is_err());
        assert!(parse_str("1 +").is_err());
        assert!(parse_str("1 2").is_err());
        assert!(parse_str("[ ] + 1").is_err());
    }
}
