//! Rehearse Analysis
//!
//! Ties parsing, comment attachment and symbol building together into one
//! [`AnalyzedFile`] per document, reports diagnostics, and answers the
//! "what is being typed here" question editors ask for completion.

mod analyzer;
mod completion;
mod config;
mod cursor;
mod diagnostics;
mod resolver;
mod validate;

pub use analyzer::{AnalyzedFile, Analyzer};
pub use completion::{completion_context, CompletionContext, CompletionKind};
pub use config::AnalyzerConfig;
pub use cursor::{previous_token, token_at};
pub use diagnostics::*;
pub use resolver::{FsResolver, ResolveError};
pub use validate::*;

use std::path::Path;

/// Analyze `source` with the default configuration and no import loading
pub fn analyze(path: Option<&Path>, source: &str) -> AnalyzedFile {
    Analyzer::default().analyze(path, source)
}
