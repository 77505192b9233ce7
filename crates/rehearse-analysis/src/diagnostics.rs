//! Diagnostics reported to editors and the CLI

use std::fmt;

use rehearse_ast::{Position, Span};
use rehearse_parser::ParseError;
use serde::{Deserialize, Serialize};

/// Code of every diagnostic derived from a parse error
pub const PARSE_ERROR: &str = "parse-error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Hint => "hint",
        };
        f.write_str(name)
    }
}

/// A located problem in a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub span: Span,
    pub severity: Severity,
    pub message: String,
    /// Machine-readable kind, e.g. `parse-error` or `unknown-query`
    pub code: String,
    /// Tool that produced the diagnostic
    pub source: String,
}

impl Diagnostic {
    /// Create an error diagnostic
    pub fn error(span: Span, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            span,
            severity: Severity::Error,
            message: message.into(),
            code: code.into(),
            source: String::new(),
        }
    }

    pub fn warning(span: Span, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::error(span, code, message).with_severity(Severity::Warning)
    }

    /// Set severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// One diagnostic per positional error inside `error`. An error that
    /// carries no position at all is reported once at the document start.
    pub fn from_parse_error(error: &ParseError, source: &str) -> Vec<Diagnostic> {
        let diagnostics: Vec<_> = error
            .errors()
            .into_iter()
            .map(|e| Diagnostic::error(e.span(), PARSE_ERROR, e.message()).with_source(source))
            .collect();
        if !diagnostics.is_empty() {
            return diagnostics;
        }
        vec![
            Diagnostic::error(Span::point(Position::start()), PARSE_ERROR, error.message())
                .with_source(source),
        ]
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}: {} [{}]",
            self.span.start, self.severity, self.message, self.code
        )
    }
}
