//! Rehearse Parser - Recursive descent parser
//!
//! Parses suite documents into a [`Suite`] tree. Two modes:
//! - strict: the first grammar error aborts and no tree is produced
//! - recovery: failed members are skipped up to a synchronisation point,
//!   recorded in [`rehearse_ast::RecoveryMeta`], and parsing continues

mod error;
mod parser;

pub use error::*;
pub use parser::*;

use rehearse_ast::{Suite, Trivia};
use rehearse_lexer::tokenize;
use tracing::debug;

/// Result of one parse
#[derive(Debug, Clone, Default)]
pub struct ParseOutput {
    pub suite: Option<Suite>,
    pub error: Option<ParseError>,
    /// Comments and whitespace of the document, in source order
    pub trivia: Vec<Trivia>,
}

impl ParseOutput {
    pub fn into_parts(self) -> (Option<Suite>, Option<ParseError>) {
        (self.suite, self.error)
    }

    pub fn is_clean(&self) -> bool {
        self.suite.is_some() && self.error.is_none()
    }
}

/// Strict parse: `(None, Some(error))` on the first grammar error.
pub fn parse(source: &str) -> ParseOutput {
    parse_with_recovery(source, false)
}

/// Parse with member-level recovery when `allow_recovery` is set.
///
/// With recovery a tree is always produced; the error, if any, collects
/// every failure met (as [`ParseError::Multiple`] when there are several).
pub fn parse_with_recovery(source: &str, allow_recovery: bool) -> ParseOutput {
    let tokens = tokenize(source);
    let trivia = Trivia::collect(&tokens);
    let mut parser = Parser::new(tokens, allow_recovery);

    match parser.parse_suite() {
        Ok(suite) => {
            let errors = parser.take_errors();
            debug!(
                recovery = allow_recovery,
                errors = errors.len(),
                scopes = suite.scopes.len(),
                "parsed suite"
            );
            ParseOutput {
                suite: Some(suite),
                error: ParseError::from_errors(errors),
                trivia,
            }
        }
        Err(err) => {
            debug!(error = %err, "strict parse failed");
            ParseOutput {
                suite: None,
                error: Some(err),
                trivia,
            }
        }
    }
}
