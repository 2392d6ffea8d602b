use std::io::Write;

use crate::token::Token;

/// Writes a single diagnostic line to `sink` in the canonical format.
pub fn report(sink: &mut dyn Write, line: usize, message: &str) -> std::io::Result<()> {
    writeln!(sink, "Error (line {line}): {message}")
}

/// Implemented by every stage's error type so the driver can report any of
/// them through the same sink without matching on a combined enum.
pub trait Reportable {
    fn line(&self) -> usize;
    fn message(&self) -> &str;

    fn report(&self, sink: &mut dyn Write) -> std::io::Result<()> {
        report(sink, self.line(), self.message())
    }
}

/// Raised by the lexer.
#[derive(Debug, Clone)]
pub struct ScanError {
    pub line: usize,
    pub message: String,
}

impl Reportable for ScanError {
    fn line(&self) -> usize {
        self.line
    }

    fn message(&self) -> &str {
        &self.message
    }
}

/// Raised by the parser. Carries the offending token so callers that want
/// more context (synchronisation, tests) can inspect it; diagnostics only
/// ever print the line and message.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub token: Token,
    pub message: String,
}

impl Reportable for ParseError {
    fn line(&self) -> usize {
        self.token.line
    }

    fn message(&self) -> &str {
        &self.message
    }
}

/// Raised by the resolver.
#[derive(Debug, Clone)]
pub struct ResolveError {
    pub token: Token,
    pub message: String,
}

impl Reportable for ResolveError {
    fn line(&self) -> usize {
        self.token.line
    }

    fn message(&self) -> &str {
        &self.message
    }
}

/// Raised by the evaluator. Keeps the full token (not just the line) because
/// some call sites need the lexeme for a secondary diagnostic.
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl RuntimeError {
    pub fn new(token: Token, message: impl Into<String>) -> Self {
        RuntimeError { token, message: message.into() }
    }
}

impl Reportable for RuntimeError {
    fn line(&self) -> usize {
        self.token.line
    }

    fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn formats_error_line() {
        let mut buf = Vec::new();
        report(&mut buf, 3, "undefined variable 'a'").unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "Error (line 3): undefined variable 'a'\n");
    }
}
