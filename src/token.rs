use log::debug;
use serde::Serialize;
use std::fmt;
use std::mem;

/// Token kinds. Only `STRING` and `NUMBER` carry a payload; comparison
/// ignores it.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Serialize)]
#[rustfmt::skip]
pub enum TokenType {
    // punctuation
    LEFT_PAREN, RIGHT_PAREN, LEFT_BRACE, RIGHT_BRACE,
    COMMA, DOT, SEMICOLON, COLON, QUESTION,

    // operators
    MINUS, PLUS, SLASH, STAR, PERCENT,
    PLUS_EQUAL, MINUS_EQUAL,
    BANG, BANG_EQUAL,
    EQUAL, EQUAL_EQUAL,
    GREATER, GREATER_EQUAL,
    LESS, LESS_EQUAL,
    AND, OR,

    // literals
    IDENTIFIER,
    STRING(String),
    NUMBER(f64),

    // keywords; `static` is reserved and never valid in a program
    BREAK, CLASS, CONTINUE, ELSE, FALSE, FUNC, FOR, IF, NIL,
    PRINT, RETURN, STATIC, SUPER, THIS, TRUE, VAR, WHILE,

    EOF,
}

impl PartialEq for TokenType {
    fn eq(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

/// A scanned token: its type (with literal payload), the original lexeme,
/// and the line number where it was found.
///
/// Tokens own their lexeme so the syntax tree built from them can outlive the
/// source text of a single prompt line.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Token {
    /// The category of this token.
    pub token_type: TokenType,

    /// The exact substring from the source that produced this token.
    pub lexeme: String,

    /// 1‑based line number in the source.
    pub line: usize,
}

impl Token {
    /// Create a new Token with the given type, lexeme, and line.
    pub fn new<S: Into<String>>(token_type: TokenType, lexeme: S, line: usize) -> Self {
        let lexeme: String = lexeme.into();

        debug!(
            "Creating new token: type={:?}, lexeme={}, line={}",
            token_type, lexeme, line
        );

        Self {
            token_type,
            lexeme,
            line,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.token_type {
            TokenType::STRING(s) => write!(f, "STRING {} {}", self.lexeme, s),
            TokenType::NUMBER(n) => {
                // 3 → "3.0", 3.14 → "3.14"
                if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
                    let mut buf: itoa::Buffer = itoa::Buffer::new();
                    write!(f, "NUMBER {} {}.0", self.lexeme, buf.format(*n as i64))
                } else {
                    write!(f, "NUMBER {} {}", self.lexeme, n)
                }
            }
            // payload-free variants debug-print as their bare name
            other => write!(f, "{:?} {} null", other, self.lexeme),
        }
    }
}
