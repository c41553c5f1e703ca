#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;
use std::thread;

use nad_interpreter::session::{Mode, Session, INTERPRETER_STACK_SIZE};

/// In‑memory `Write` sink that stays readable after being boxed into a session.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A session whose program output and diagnostics are captured separately.
pub fn capture(mode: Mode) -> (Session, SharedBuffer, SharedBuffer) {
    let out = SharedBuffer::new();
    let diagnostics = SharedBuffer::new();
    let session = Session::with_writers(mode, Box::new(out.clone()), Box::new(diagnostics.clone()));
    (session, out, diagnostics)
}

pub struct Outcome {
    pub output: Vec<String>,
    pub diagnostics: Vec<String>,
    pub exit_code: i32,
}

/// Run `source` as a script file.
pub fn run_file(source: &str) -> Outcome {
    let (mut session, out, diagnostics) = capture(Mode::File);
    session.run(source);

    Outcome {
        output: out.lines(),
        diagnostics: diagnostics.lines(),
        exit_code: session.exit_code(),
    }
}

/// Printed lines of a script expected to run cleanly.
pub fn output_of(source: &str) -> Vec<String> {
    let outcome = run_file(source);
    assert!(
        outcome.diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        outcome.diagnostics
    );
    outcome.output
}

/// Run `job` on a thread with the stack the binary gives its interpreter.
pub fn on_interpreter_stack<T, F>(job: F) -> T
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    thread::Builder::new()
        .stack_size(INTERPRETER_STACK_SIZE)
        .spawn(job)
        .expect("spawn interpreter thread")
        .join()
        .expect("interpreter thread finished")
}
