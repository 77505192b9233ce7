//! Symbol records

use std::path::PathBuf;

use rehearse_ast::Span;
use serde::{Deserialize, Serialize};

/// A named query of the document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuerySymbol {
    pub name: String,
    /// `$parameter` names used by the body, without the sigil
    pub params: Vec<String>,
    /// Field names the body returns
    pub returns: Vec<String>,
    pub body: String,
    /// `None` when extracted from raw text
    pub span: Option<Span>,
}

/// An import binding
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportSymbol {
    pub alias: String,
    pub path: String,
    pub span: Option<Span>,
    /// Location of the imported file, set once it has been loaded
    pub resolved: Option<PathBuf>,
    /// Queries the imported module defines
    pub queries: Vec<String>,
}

impl ImportSymbol {
    pub fn exports(&self, query: &str) -> bool {
        self.queries.iter().any(|q| q == query)
    }
}

/// A test, keyed by its full path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestSymbol {
    /// `scope/group/.../name`
    pub path: String,
    pub scope: String,
    pub groups: Vec<String>,
    pub name: String,
    pub span: Span,
}

impl TestSymbol {
    pub fn new(scope: &str, groups: &[String], name: &str, span: Span) -> Self {
        let mut parts = Vec::with_capacity(groups.len() + 2);
        parts.push(scope);
        parts.extend(groups.iter().map(String::as_str));
        parts.push(name);
        Self {
            path: parts.join("/"),
            scope: scope.to_string(),
            groups: groups.to_vec(),
            name: name.to_string(),
            span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_symbol_path() {
        let groups = vec!["outer".to_string(), "inner".to_string()];
        let symbol = TestSymbol::new("GetUser", &groups, "finds", Span::dummy());
        assert_eq!(symbol.path, "GetUser/outer/inner/finds");
        assert_eq!(TestSymbol::new("Q", &[], "t", Span::dummy()).path, "Q/t");
    }
}
