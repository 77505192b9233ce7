//! Parser error types

use rehearse_ast::{Position, Span, Token, TokenKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum ParseError {
    #[error("unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("unexpected end of file, expected {expected}")]
    UnexpectedEof { expected: String, span: Span },

    #[error("unterminated query body")]
    UnterminatedBody { span: Span },

    #[error("invalid character '{text}'")]
    InvalidCharacter { text: String, span: Span },

    #[error("duplicate {what}")]
    Duplicate { what: String, span: Span },

    #[error("{} parse errors", .0.len())]
    Multiple(Vec<ParseError>),
}

impl ParseError {
    /// Build the error for finding `found` where `expected` was required.
    pub fn unexpected(expected: impl Into<String>, found: &Token) -> Self {
        let expected = expected.into();
        let span = found.span();
        match found.kind {
            TokenKind::Eof => ParseError::UnexpectedEof { expected, span },
            TokenKind::UnterminatedRaw => ParseError::UnterminatedBody { span },
            TokenKind::Error => ParseError::InvalidCharacter {
                text: found.text.clone(),
                span,
            },
            _ => ParseError::UnexpectedToken {
                expected,
                found: found.describe(),
                span,
            },
        }
    }

    /// Collapse a list of errors: one error is returned as itself.
    pub fn from_errors(mut errors: Vec<ParseError>) -> Option<ParseError> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(ParseError::Multiple(errors)),
        }
    }

    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::UnexpectedEof { span, .. }
            | ParseError::UnterminatedBody { span }
            | ParseError::InvalidCharacter { span, .. }
            | ParseError::Duplicate { span, .. } => *span,
            ParseError::Multiple(errors) => errors.first().map(|e| e.span()).unwrap_or_default(),
        }
    }

    /// Where the error was detected; the first sub-error's for `Multiple`.
    pub fn position(&self) -> Position {
        self.span().start
    }

    pub fn message(&self) -> String {
        self.to_string()
    }

    /// The positional errors, with `Multiple` flattened
    pub fn errors(&self) -> Vec<&ParseError> {
        match self {
            ParseError::Multiple(errors) => errors.iter().flat_map(|e| e.errors()).collect(),
            single => vec![single],
        }
    }
}
