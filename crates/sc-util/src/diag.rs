//! Diagnostic collection.
//!
//! A `Handler` accumulates `Diagnostic`s from any pipeline stage so the CLI
//! can print them uniformly and decide whether to keep going. The five
//! error kinds from the error-handling design (preprocessing, lexical,
//! syntactic, runtime, emission) all render through this.

use crate::span::Span;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Note,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: Option<Span>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            span: None,
        }
    }

    pub fn note(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Note,
            message: message.into(),
            span: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Note => "note",
        };
        match &self.span {
            Some(span) => write!(f, "{prefix}: {} at {span}", self.message),
            None => write!(f, "{prefix}: {}", self.message),
        }
    }
}

#[derive(Debug, Default)]
pub struct Handler {
    diagnostics: Vec<Diagnostic>,
}

impl Handler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, diag: Diagnostic) {
        self.diagnostics.push(diag);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn first_error(&self) -> Option<&Diagnostic> {
        self.diagnostics
            .iter()
            .find(|d| d.severity == Severity::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_errors_separately_from_notes() {
        let mut h = Handler::new();
        h.emit(Diagnostic::note("fyi"));
        assert!(!h.has_errors());
        h.emit(Diagnostic::error("boom"));
        assert!(h.has_errors());
        assert_eq!(h.first_error().unwrap().message, "boom");
    }
}
