//! Interpreter context wiring scanner → parser → resolver → evaluator.
//!
//! A [`Session`] owns everything that must survive between inputs of the
//! interactive prompt: the evaluator (and with it the global environment and
//! resolution table), the diagnostics flags and the next free expression id.

use std::io::{self, Write};

use log::{debug, info};

use crate::ast::Stmt;
use crate::diagnostics::Diagnostics;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::token::Token;

/// Stack reserved for the thread that runs a session; deep but bounded
/// recursion (see [`crate::interpreter::MAX_CALL_DEPTH`]) must fit in it.
pub const INTERPRETER_STACK_SIZE: usize = 256 * 1024 * 1024;

/// How source reaches the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// A whole script file; expression statements print nothing.
    File,

    /// The `>> ` prompt; top‑level expression statements echo their value.
    Interactive,
}

pub struct Session {
    interpreter: Interpreter,
    diagnostics: Diagnostics,
    next_expr_id: usize,
}

impl Session {
    /// Program output and diagnostics both go to stdout.
    pub fn new(mode: Mode) -> Self {
        Self::with_writers(mode, Box::new(io::stdout()), Box::new(io::stdout()))
    }

    pub fn with_writers(mode: Mode, out: Box<dyn Write>, diagnostics: Box<dyn Write>) -> Self {
        info!("Starting {:?} session", mode);

        let mut interpreter = Interpreter::with_output(out);
        interpreter.set_echo(mode == Mode::Interactive);

        Self {
            interpreter,
            diagnostics: Diagnostics::new(diagnostics),
            next_expr_id: 0,
        }
    }

    /// Scan `source`, reporting lexical errors and returning every good token
    /// (always ending with `EOF`).
    pub fn scan(&mut self, source: &str) -> Vec<Token> {
        self.scan_counting(source).0
    }

    fn scan_counting(&mut self, source: &str) -> (Vec<Token>, usize) {
        let mut tokens: Vec<Token> = Vec::new();
        let mut errors: usize = 0;

        for result in Scanner::new(source) {
            match result {
                Ok(token) => tokens.push(token),
                Err(e) => {
                    errors += 1;
                    self.diagnostics.report(&e);
                }
            }
        }

        debug!("Scanned {} tokens with {} error(s)", tokens.len(), errors);
        (tokens, errors)
    }

    /// Scan and parse. `None` when any lexical or syntax error was reported;
    /// a lexical error stops before parsing.
    pub fn parse(&mut self, source: &str) -> Option<Vec<Stmt>> {
        let (tokens, lex_errors) = self.scan_counting(source);
        if lex_errors > 0 {
            info!("Skipping parse after {} lexical error(s)", lex_errors);
            return None;
        }

        let mut parser = Parser::with_first_id(tokens, self.next_expr_id);
        let parsed = parser.parse();
        self.next_expr_id = parser.next_id();

        match parsed {
            Ok(statements) => Some(statements),
            Err(errors) => {
                self.diagnostics.report_all(errors);
                None
            }
        }
    }

    /// Run one program (a file, or a single prompt line) through every stage.
    /// Later stages are skipped once an earlier one reported an error.
    pub fn run(&mut self, source: &str) {
        let Some(statements) = self.parse(source) else {
            info!("Skipping execution after syntax errors");
            return;
        };

        if let Err(errors) = Resolver::new(&mut self.interpreter).resolve(&statements) {
            self.diagnostics.report_all(errors);
            return;
        }

        if let Err(e) = self.interpreter.interpret(&statements) {
            self.diagnostics.report(&e);
        }
    }

    /// Clear the error flags; the global environment is kept.
    pub fn reset(&mut self) {
        self.diagnostics.reset();
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn exit_code(&self) -> i32 {
        self.diagnostics.exit_code()
    }
}
