//! Text-only symbol extraction for documents that produced no tree

use std::sync::LazyLock;

use regex::Regex;
use rehearse_ast::Import;

use crate::{SymbolExtractor, SymbolTable};

static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*import[ \t]+(?:([A-Za-z_][A-Za-z0-9_]*)[ \t]+)?"([^"\n]*)""#).unwrap()
});

// An unterminated body runs to the end of the input.
static QUERY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*query[ \t]+([A-Za-z_][A-Za-z0-9_]*)\s*`([^`]*)`?").unwrap()
});

impl SymbolExtractor<'_> {
    /// Best-effort imports and queries straight from source text. Symbols
    /// carry no span and no tests are found.
    pub fn extract_from_source(&self, source: &str) -> SymbolTable {
        let mut table = SymbolTable::new();

        for caps in IMPORT_RE.captures_iter(source) {
            let import = Import {
                alias: caps.get(1).map(|m| m.as_str().to_string()),
                path: caps[2].to_string(),
                ..Default::default()
            };
            if let Some(mut symbol) = self.import_symbol(&import) {
                symbol.span = None;
                table.insert_import(symbol);
            }
        }

        for caps in QUERY_RE.captures_iter(source) {
            table.insert_query(self.query_symbol(&caps[1], &caps[2], None));
        }

        table
    }
}
