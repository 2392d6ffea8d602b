#![allow(clippy::needless_return)]

//! Flint is a programming language written in Rust. It is a dynamically
//! typed language with lexical scoping, closures, and single-inheritance
//! classes. Flint is a tree-walk interpreter with a hand-written recursive
//! descent parser.
//!
//! ## Scanning
//! The first step is scanning: converting a string of characters into a
//! list of tokens. The scanner is implemented in [`scanner`] as a stateful
//! walk over a character iterator, and reports lexical mistakes as
//! [`ScanError`](error::ScanError) — an unterminated string, an unknown
//! character — without stopping at the first one.
//!
//! ## Parsing
//! The second step is parsing: converting the token list into an abstract
//! syntax tree. [`parser`] is a recursive descent parser following the
//! grammar's precedence chain from `assignment` down to `primary`.
//! [`Expressions`](expr::Expr) produce an [`Object`](object::Object);
//! [`Statements`](stmt::Stmt) perform a side effect. The parser reports
//! [`ParseError`](error::ParseError)s and recovers at the next statement
//! boundary so multiple mistakes surface in one pass.
//!
//! ## Resolving
//! The third step is resolving: a static pass over the AST that records,
//! for every variable reference, how many environment frames separate it
//! from its binding. [`resolver`] produces this side table; the evaluator
//! never has to search for a binding by name across an unbounded number of
//! frames. The resolver also catches errors that are syntactically valid
//! but semantically wrong, such as reading a local in its own initializer.
//!
//! ## Interpreting
//! The final step is interpreting: walking the AST and producing values.
//! [`interpreter`] holds the global frame, the current frame, and the
//! resolver's side table, and reports [`RuntimeError`](error::RuntimeError)
//! for the mistakes no earlier stage can catch — adding a string to a
//! number, calling something that isn't callable.

use std::cell::RefCell;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::rc::Rc;

use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;

pub mod class;
pub mod environment;
pub mod error;
pub mod expr;
pub mod function;
pub mod interpreter;
pub mod literal;
pub mod object;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod stmt;
pub mod token;

use environment::Environment;
use error::Reportable;
use interpreter::Interpreter;
use parser::Parser;
use resolver::Resolver;
use scanner::Scanner;

/// Which stage (if any) reported an error while running one unit of source.
/// The driver uses this to decide the process exit code in file mode.
enum Outcome {
    Ok,
    StaticError,
    RuntimeError,
}

/// Drives source through scan → parse → resolve → interpret. Holds the
/// global environment frame across calls to `run`, so a REPL session keeps
/// variables defined on one line visible to the next.
pub struct Flint {
    globals: Rc<RefCell<Environment>>,
}

impl Flint {
    pub fn new() -> Self {
        Flint { globals: Interpreter::globals_with_natives() }
    }

    /// Runs a whole script file. Exits the process with 65 on a scan,
    /// parse, or resolve error, or 70 on a runtime error; returns normally
    /// on success.
    pub fn run_file(&mut self, path: impl AsRef<Path>) {
        let source = fs::read_to_string(path).expect("should be able to read the script file");

        let mut stdout = io::stdout();
        match self.run(&source, &mut stdout) {
            Outcome::Ok => {}
            Outcome::StaticError => process::exit(65),
            Outcome::RuntimeError => process::exit(70),
        }
    }

    /// Runs an interactive read-eval-print loop. Each line is scanned,
    /// parsed, resolved, and interpreted independently — a mistake on one
    /// line does not end the session — but all lines share this session's
    /// global environment. A clean EOF (Ctrl-D) prints `bye` and returns.
    pub fn run_prompt(&mut self) {
        let mut editor: Editor<(), DefaultHistory> =
            Editor::new().expect("should be able to start the line editor");
        let history_path = history_path();
        if let Some(path) = &history_path {
            let _ = editor.load_history(path);
        }

        loop {
            match editor.readline("> ") {
                Ok(line) => {
                    let _ = editor.add_history_entry(line.as_str());
                    let mut stdout = io::stdout();
                    self.run(&line, &mut stdout);
                }
                Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => {
                    println!("bye");
                    break;
                }
                Err(err) => {
                    eprintln!("{err}");
                    break;
                }
            }
        }

        if let Some(path) = &history_path {
            let _ = editor.save_history(path);
        }
    }

    /// Runs one unit of source against an in-memory sink, returning the
    /// captured output and whether it completed without error. Exposed for
    /// tests that want to assert on combined print-plus-diagnostic output
    /// without going through a file or the real standard output.
    pub fn run_to_string(&mut self, source: &str) -> (String, bool) {
        let mut sink = Vec::new();
        let ok = matches!(self.run(source, &mut sink), Outcome::Ok);
        (String::from_utf8(sink).expect("interpreter output is always valid UTF-8"), ok)
    }

    /// Runs one unit of source against `sink`, which receives both `print`
    /// output and any diagnostics in program order. Stops after the first
    /// stage that reports an error; later stages never see a broken AST.
    fn run(&mut self, source: &str, sink: &mut dyn Write) -> Outcome {
        let (tokens, scan_errors) = Scanner::new(source).scan_tokens();
        for error in &scan_errors {
            let _ = error.report(sink);
        }
        if !scan_errors.is_empty() {
            return Outcome::StaticError;
        }

        let (statements, parse_errors) = Parser::new(tokens).parse();
        for error in &parse_errors {
            let _ = error.report(sink);
        }
        if !parse_errors.is_empty() {
            return Outcome::StaticError;
        }

        let (locals, resolve_errors) = Resolver::new().resolve(&statements);
        for error in &resolve_errors {
            let _ = error.report(sink);
        }
        if !resolve_errors.is_empty() {
            return Outcome::StaticError;
        }

        let mut interpreter = Interpreter::with_globals(locals, sink, Rc::clone(&self.globals));
        match interpreter.interpret(&statements) {
            Ok(()) => Outcome::Ok,
            Err(error) => {
                let _ = error.report(sink);
                Outcome::RuntimeError
            }
        }
    }
}

impl Default for Flint {
    fn default() -> Self {
        Self::new()
    }
}

fn history_path() -> Option<PathBuf> {
    home::home_dir().map(|dir| dir.join(".flint_history"))
}

#[cfg(test)]
mod test {
    use super::*;

    fn run(source: &str) -> (String, bool) {
        Flint::new().run_to_string(source)
    }

    #[test]
    fn successful_run_produces_no_exit_signal() {
        let (output, ok) = run("print 1 + 1;");
        assert_eq!(output, "2\n");
        assert!(ok);
    }

    #[test]
    fn parse_error_is_reported_and_stops_before_interpreting() {
        let (output, ok) = run("1 +;\nprint \"unreached\";");
        assert!(!ok);
        assert!(output.starts_with("Error (line 1):"));
        assert!(!output.contains("unreached"));
    }

    #[test]
    fn runtime_error_is_reported_in_canonical_format() {
        let (output, ok) = run("print 1 + \"a\";");
        assert!(!ok);
        assert_eq!(output, "Error (line 1): operands must be two numbers or two strings\n");
    }

    #[test]
    fn global_environment_persists_across_calls() {
        let mut flint = Flint::new();
        flint.run_to_string("var counter = 0;");
        flint.run_to_string("counter = counter + 1;");
        let (output, _) = flint.run_to_string("print counter;");
        assert_eq!(output, "1\n");
    }
}
