//! rehearse-symbols: Symbol table builder
//!
//! Turns a parsed suite into flat lookup tables of imports, queries and
//! tests. The builder works on whatever tree is available:
//! - a clean strict tree
//! - a recovery tree, whose placeholder nodes are skipped
//! - no tree at all, in which case imports and queries are scraped from the
//!   source text
//!
//! The builder never fails; missing information simply yields fewer symbols.

mod analyzer;
mod extractor;
mod fallback;
mod resolver;
mod symbol;
mod table;

pub use analyzer::{scan_params, scan_returns, PatternAnalyzer, QueryAnalyzer};
pub use extractor::SymbolExtractor;
pub use resolver::{resolve_relative, ModuleExports, ModuleResolver};
pub use symbol::{ImportSymbol, QuerySymbol, TestSymbol};
pub use table::SymbolTable;

use rehearse_ast::Suite;
use tracing::debug;

/// Build a table with the default query analyzer and no import resolution
pub fn build_symbol_table(suite: &Suite) -> SymbolTable {
    SymbolExtractor::new(&PatternAnalyzer).extract(suite)
}

/// Use the strict tree if there is one, then the recovery tree, then the
/// raw source.
pub fn build_best_effort(
    extractor: &SymbolExtractor<'_>,
    strict: Option<&Suite>,
    recovered: Option<&Suite>,
    source: &str,
) -> SymbolTable {
    if let Some(suite) = strict {
        return extractor.extract(suite);
    }
    if let Some(suite) = recovered {
        debug!("building symbols from the recovery tree");
        return extractor.extract(suite);
    }
    debug!("no tree available, scanning source text for symbols");
    extractor.extract_from_source(source)
}
