//! Rehearse - error-tolerant analysis for database test suites
//!
//! This is the root workspace crate that provides integration tests.
//! The actual implementation is in the workspace member crates.

// Re-export main crates for convenience
pub use rehearse_analysis as analysis;
pub use rehearse_ast as ast;
pub use rehearse_lexer as lexer;
pub use rehearse_parser as parser;
pub use rehearse_symbols as symbols;
