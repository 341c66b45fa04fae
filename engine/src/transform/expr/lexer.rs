//! Tokenizer for calculation expressions.

use crate::error::{ExpressionError, ExpressionResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Str(String),
    /// `[name]`, contents trimmed
    Field(String),
    Plus,
    Minus,
    Star,
    Slash,
    Amp,
    LParen,
    RParen,
}

impl Token {
    pub fn describe(&self) -> String {
        match self {
            Token::Number(n) => n.to_string(),
            Token::Str(s) => format!("\"{}\"", s),
            Token::Field(f) => format!("[{}]", f),
            Token::Plus => "+".to_string(),
            Token::Minus => "-".to_string(),
            Token::Star => "*".to_string(),
            Token::Slash => "/".to_string(),
            Token::Amp => "&".to_string(),
            Token::LParen => "(".to_string(),
            Token::RParen => ")".to_string(),
        }
    }
}

pub fn tokenize(input: &str) -> ExpressionResult<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let ch = chars[pos];
        match ch {
            c if c.is_whitespace() => pos += 1,
            '+' => push(&mut tokens, &mut pos, Token::Plus),
            '-' => push(&mut tokens, &mut pos, Token::Minus),
            '*' => push(&mut tokens, &mut pos, Token::Star),
            '/' => push(&mut tokens, &mut pos, Token::Slash),
            '&' => push(&mut tokens, &mut pos, Token::Amp),
            '(' => push(&mut tokens, &mut pos, Token::LParen),
            ')' => push(&mut tokens, &mut pos, Token::RParen),
            '"' | '\'' => {
                let end = find_closing(&chars, pos + 1, ch).ok_or(ExpressionError::Unterminated("string literal"))?;
                tokens.push(Token::Str(chars[pos + 1..end].iter().collect()));
                pos = end + 1;
            }
            '[' => {
                let end = find_closing(&chars, pos + 1, ']').ok_or(ExpressionError::Unterminated("field reference"))?;
                let name: String = chars[pos + 1..end].iter().collect();
                tokens.push(Token::Field(name.trim().to_string()));
                pos = end + 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = pos;
                let mut seen_dot = false;
                while pos < chars.len() && (chars[pos].is_ascii_digit() || (chars[pos] == '.' && !seen_dot)) {
                    seen_dot |= chars[pos] == '.';
                    pos += 1;
                }
                let literal: String = chars[start..pos].iter().collect();
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| ExpressionError::Syntax(format!("invalid number '{}'", literal)))?;
                tokens.push(Token::Number(value));
            }
            other => return Err(ExpressionError::UnexpectedChar { ch: other, pos }),
        }
    }

    Ok(tokens)
}

fn push(tokens: &mut Vec<Token>, pos: &mut usize, token: Token) {
    tokens.push(token);
    *pos += 1;
}

fn find_closing(chars: &[char], from: usize, close: char) -> Option<usize> {
    (from..chars.len()).find(|&i| chars[i] == close)
}
