//! Rehearse AST - Core types for parsed test suites
//!
//! This crate defines source positions and spans, the token and trivia model
//! shared with the scanner, all AST node types with their comment and
//! recovery metadata, the pre-order traversal, and comment attachment.

mod span;
mod token;
mod meta;
mod decl;
mod setup;
mod stmt;
mod expr;
mod visit;
mod trivia;

pub use span::*;
pub use token::*;
pub use meta::*;
pub use decl::*;
pub use setup::*;
pub use stmt::*;
pub use expr::*;
pub use visit::*;
pub use trivia::*;
