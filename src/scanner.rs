//! Module `scanner` implements a one‑pass, streaming lexer for the Nad language.
//!
//! It transforms a source string into a sequence of [`Token`]s, skipping whitespace
//! and comments, and emitting exactly one `EOF` token at the end. Designed as a
//! `FusedIterator`, it can be chained safely with other iterator adapters.
//!
//! # Public API
//!
//! - `Scanner::new(src: &'a str) -> Scanner<'a>`
//!   Create a new lexer over the input text.
//!
//! - `impl Iterator for Scanner<'a>`
//!   Yields `Result<Token, LoxError>` on each `.next()`. Errors are interleaved
//!   with tokens so a caller sees every lexical problem of the input in one pass.
//!
//! # Token Recognition (`scan_token`)
//!
//! - Single‑character tokens: `(`, `)`, `{`, `}`, `,`, `.`, `;`, `:`, `?`, `*`, `%`.
//! - One‑or‑two character operators: `+ +=`, `- -=`, `! !=`, `= ==`, `< <=`, `> >=`.
//! - Logical operators `&&` and `||`; a lone `&` or `|` is an error.
//! - Comments: `//` to end of line and `/* … */` (not nested).
//! - String literals: `"` … `"`, may span lines, no escape sequences.
//! - Numeric literals: integer and optional fractional part.
//! - Identifiers/keywords resolved via a perfect‑hash `KEYWORDS` map.
//!
//! # Performance
//!
//! - Comment skipping uses `memchr` / `memchr::memmem` instead of byte loops.
//! - `#[inline(always)]` on hot path helpers.
//!
//! # Example
//!
//! ```rust
//! use nad_interpreter::scanner::Scanner;
//!
//! let scanner = Scanner::new("print 123; // example");
//! for result in scanner {
//!     match result {
//!         Ok(token) => println!("{}", token),
//!         Err(err) => println!("{}", err),
//!     }
//! }
//! ```

use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::{memchr, memchr_iter, memmem};
use phf::phf_map;
use std::iter::FusedIterator;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"break"    => TokenType::BREAK,
    b"class"    => TokenType::CLASS,
    b"continue" => TokenType::CONTINUE,
    b"else"     => TokenType::ELSE,
    b"false"    => TokenType::FALSE,
    b"for"      => TokenType::FOR,
    b"func"     => TokenType::FUNC,
    b"if"       => TokenType::IF,
    b"nil"      => TokenType::NIL,
    b"print"    => TokenType::PRINT,
    b"return"   => TokenType::RETURN,
    b"static"   => TokenType::STATIC,
    b"super"    => TokenType::SUPER,
    b"this"     => TokenType::THIS,
    b"true"     => TokenType::TRUE,
    b"var"      => TokenType::VAR,
    b"while"    => TokenType::WHILE,
};

/// Streaming lexer: yields one [`Token`] (or lex error) per `next()` call and
/// finishes with a single `EOF` token.
pub struct Scanner<'a> {
    source: &'a str,
    bytes: &'a [u8],
    start: usize, // first byte of the lexeme being scanned
    curr: usize,  // next unread byte
    line: usize,
}

impl<'a> Scanner<'a> {
    #[inline]
    pub fn new(source: &'a str) -> Self {
        info!("Scanner created over {} bytes", source.len());

        Self {
            source,
            bytes: source.as_bytes(),
            start: 0,
            curr: 0,
            line: 1,
        }
    }

    // ───────────────────────────── cursor ───────────────────────────────────

    #[inline(always)]
    fn exhausted(&self) -> bool {
        self.curr >= self.bytes.len()
    }

    #[inline(always)]
    fn bump(&mut self) -> u8 {
        let b = self.bytes[self.curr];
        self.curr += 1;
        b
    }

    /// Byte `offset` positions ahead of the cursor, `0` past the end.
    #[inline(always)]
    fn look(&self, offset: usize) -> u8 {
        self.bytes.get(self.curr + offset).copied().unwrap_or(0)
    }

    #[inline(always)]
    fn eat(&mut self, expected: u8) -> bool {
        let hit = self.look(0) == expected;
        if hit {
            self.curr += 1;
        }
        hit
    }

    /// `long` when the next byte is `second` (consumed), else `short`.
    #[inline(always)]
    fn either(&mut self, second: u8, long: TokenType, short: TokenType) -> TokenType {
        if self.eat(second) {
            long
        } else {
            short
        }
    }

    // ───────────────────────────── lexemes ──────────────────────────────────

    /// Scans one lexeme. `Ok(None)` means whitespace or a comment was skipped.
    fn scan_token(&mut self) -> Result<Option<TokenType>> {
        use TokenType as T;

        let kind = match self.bump() {
            b'(' => T::LEFT_PAREN,
            b')' => T::RIGHT_PAREN,
            b'{' => T::LEFT_BRACE,
            b'}' => T::RIGHT_BRACE,
            b',' => T::COMMA,
            b'.' => T::DOT,
            b';' => T::SEMICOLON,
            b':' => T::COLON,
            b'?' => T::QUESTION,
            b'*' => T::STAR,
            b'%' => T::PERCENT,

            b'+' => self.either(b'=', T::PLUS_EQUAL, T::PLUS),
            b'-' => self.either(b'=', T::MINUS_EQUAL, T::MINUS),
            b'!' => self.either(b'=', T::BANG_EQUAL, T::BANG),
            b'=' => self.either(b'=', T::EQUAL_EQUAL, T::EQUAL),
            b'<' => self.either(b'=', T::LESS_EQUAL, T::LESS),
            b'>' => self.either(b'=', T::GREATER_EQUAL, T::GREATER),

            // only the doubled forms exist
            b'&' if self.eat(b'&') => T::AND,
            b'&' => return Err(LoxError::lex(self.line, "at '&'", "Expect '&&'.")),
            b'|' if self.eat(b'|') => T::OR,
            b'|' => return Err(LoxError::lex(self.line, "at '|'", "Expect '||'.")),

            b' ' | b'\r' | b'\t' => return Ok(None),
            b'\n' => {
                self.line += 1;
                return Ok(None);
            }

            b'/' if self.eat(b'/') => {
                // the newline stays unread so the line counter sees it
                self.curr = memchr(b'\n', &self.bytes[self.curr..])
                    .map_or(self.bytes.len(), |pos| self.curr + pos);
                return Ok(None);
            }
            b'/' if self.eat(b'*') => {
                self.block_comment()?;
                return Ok(None);
            }
            b'/' => T::SLASH,

            b'"' => self.string()?,
            b'0'..=b'9' => self.number(),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),

            other => {
                // report the whole code point once, keep slicing on char boundaries
                let c = self.source[self.start..]
                    .chars()
                    .next()
                    .unwrap_or(other as char);
                self.curr = self.start + c.len_utf8();

                return Err(LoxError::lex(
                    self.line,
                    "",
                    format!("Invalid character '{}'.", c),
                ));
            }
        };

        Ok(Some(kind))
    }

    /// Cursor sits just past the opening `/*`.
    fn block_comment(&mut self) -> Result<()> {
        let rest = &self.bytes[self.curr..];

        let Some(pos) = memmem::find(rest, b"*/") else {
            self.line += memchr_iter(b'\n', rest).count();
            self.curr = self.bytes.len();

            return Err(LoxError::lex(
                self.line,
                "at end",
                "Unclosed multiple-line comment.",
            ));
        };

        self.line += memchr_iter(b'\n', &rest[..pos]).count();
        self.curr += pos + 2;

        Ok(())
    }

    /// Strings may span lines; the literal excludes the quotes.
    fn string(&mut self) -> Result<TokenType> {
        let Some(len) = memchr(b'"', &self.bytes[self.curr..]) else {
            self.line += memchr_iter(b'\n', &self.bytes[self.curr..]).count();
            self.curr = self.bytes.len();

            return Err(LoxError::lex(self.line, "", "Unterminated string."));
        };

        let body = &self.source[self.curr..self.curr + len];
        self.line += memchr_iter(b'\n', body.as_bytes()).count();
        self.curr += len + 1;

        Ok(TokenType::STRING(body.to_owned()))
    }

    /// `123` or `3.14`; a dot must be followed by a digit to belong to the number.
    fn number(&mut self) -> TokenType {
        while self.look(0).is_ascii_digit() {
            self.curr += 1;
        }

        if self.look(0) == b'.' && self.look(1).is_ascii_digit() {
            self.curr += 1;
            while self.look(0).is_ascii_digit() {
                self.curr += 1;
            }
        }

        let text = &self.source[self.start..self.curr];
        TokenType::NUMBER(text.parse().unwrap_or(0.0))
    }

    fn identifier(&mut self) -> TokenType {
        while matches!(self.look(0), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_') {
            self.curr += 1;
        }

        KEYWORDS
            .get(&self.bytes[self.start..self.curr])
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

// ───────────────────────── Iterator implementation ─────────────────────────

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.curr > self.bytes.len() {
                return None;
            }

            if self.exhausted() {
                // step past the end so the EOF token is yielded exactly once
                self.curr = self.bytes.len() + 1;
                return Some(Ok(Token::new(TokenType::EOF, "", self.line)));
            }

            self.start = self.curr;

            match self.scan_token() {
                Err(e) => return Some(Err(e)),
                Ok(None) => continue,
                Ok(Some(kind)) => {
                    let lexeme = &self.source[self.start..self.curr];
                    debug!("Scanned token ({:?}) on line {}", kind, self.line);

                    return Some(Ok(Token::new(kind, lexeme, self.line)));
                }
            }
        }
    }
}

impl<'a> FusedIterator for Scanner<'a> {}
