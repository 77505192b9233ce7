//! Symbol table data structure

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{ImportSymbol, QuerySymbol, TestSymbol};

/// Name-keyed lookup tables for one document, in definition order.
///
/// Inserting a key that already exists keeps the first definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolTable {
    pub imports: IndexMap<String, ImportSymbol>,
    pub queries: IndexMap<String, QuerySymbol>,
    pub tests: IndexMap<String, TestSymbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn import(&self, alias: &str) -> Option<&ImportSymbol> {
        self.imports.get(alias)
    }

    pub fn query(&self, name: &str) -> Option<&QuerySymbol> {
        self.queries.get(name)
    }

    pub fn test(&self, path: &str) -> Option<&TestSymbol> {
        self.tests.get(path)
    }

    pub fn is_alias(&self, name: &str) -> bool {
        self.imports.contains_key(name)
    }

    /// Returns `false` if the alias was already bound
    pub fn insert_import(&mut self, symbol: ImportSymbol) -> bool {
        if self.imports.contains_key(&symbol.alias) {
            return false;
        }
        self.imports.insert(symbol.alias.clone(), symbol);
        true
    }

    pub fn insert_query(&mut self, symbol: QuerySymbol) -> bool {
        if self.queries.contains_key(&symbol.name) {
            return false;
        }
        self.queries.insert(symbol.name.clone(), symbol);
        true
    }

    pub fn insert_test(&mut self, symbol: TestSymbol) -> bool {
        if self.tests.contains_key(&symbol.path) {
            return false;
        }
        self.tests.insert(symbol.path.clone(), symbol);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty() && self.queries.is_empty() && self.tests.is_empty()
    }

    /// Aliases in definition order
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.imports.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_definition_wins() {
        let mut table = SymbolTable::new();
        assert!(table.insert_query(QuerySymbol {
            name: "Q".into(),
            body: "first".into(),
            ..Default::default()
        }));
        assert!(!table.insert_query(QuerySymbol {
            name: "Q".into(),
            body: "second".into(),
            ..Default::default()
        }));
        assert_eq!(table.query("Q").map(|q| q.body.as_str()), Some("first"));
    }

    #[test]
    fn test_alias_lookup() {
        let mut table = SymbolTable::new();
        table.insert_import(ImportSymbol {
            alias: "db".into(),
            path: "./db.rh".into(),
            ..Default::default()
        });
        assert!(table.is_alias("db"));
        assert!(!table.is_alias("Get"));
        assert_eq!(table.aliases().collect::<Vec<_>>(), vec!["db"]);
    }
}
