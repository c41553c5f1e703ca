//! Reporting facade shared by every stage of the pipeline.
//!
//! Prints each [`LoxError`] on its own line and remembers whether a syntax
//! or runtime error happened, which decides the process exit code.

use std::io::{self, Write};

use log::{error, info};

use crate::error::LoxError;

/// Exit code after a scanner, parser or resolver error.
pub const EXIT_SYNTAX_ERROR: i32 = 10;

/// Exit code after a runtime error (and no syntax error).
pub const EXIT_RUNTIME_ERROR: i32 = 11;

pub struct Diagnostics {
    sink: Box<dyn Write>,
    had_syntax_error: bool,
    had_runtime_error: bool,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(Box::new(io::stdout()))
    }
}

impl Diagnostics {
    pub fn new(sink: Box<dyn Write>) -> Self {
        Self {
            sink,
            had_syntax_error: false,
            had_runtime_error: false,
        }
    }

    /// Print one diagnostic and raise the matching flag.
    pub fn report(&mut self, err: &LoxError) {
        info!("Reporting diagnostic: {}", err);

        if err.is_syntax() {
            self.had_syntax_error = true;
        } else {
            self.had_runtime_error = true;
        }

        if let Err(e) = writeln!(self.sink, "{}", err).and_then(|_| self.sink.flush()) {
            error!("Failed to write diagnostic: {}", e);
        }
    }

    pub fn report_all<I: IntoIterator<Item = LoxError>>(&mut self, errors: I) {
        for err in errors {
            self.report(&err);
        }
    }

    pub fn had_syntax_error(&self) -> bool {
        self.had_syntax_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// Forget earlier errors; the prompt does this after every line.
    pub fn reset(&mut self) {
        self.had_syntax_error = false;
        self.had_runtime_error = false;
    }

    pub fn exit_code(&self) -> i32 {
        if self.had_syntax_error {
            EXIT_SYNTAX_ERROR
        } else if self.had_runtime_error {
            EXIT_RUNTIME_ERROR
        } else {
            0
        }
    }
}
