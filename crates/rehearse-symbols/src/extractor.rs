//! Symbol extraction from a (possibly partial) tree

use std::path::Path;

use rehearse_ast::{Import, Span, Suite, TestOrGroup};
use tracing::trace;

use crate::{ImportSymbol, ModuleResolver, QueryAnalyzer, QuerySymbol, SymbolTable, TestSymbol};

/// Builds a [`SymbolTable`] from parsed trees or, failing that, raw text.
pub struct SymbolExtractor<'a> {
    analyzer: &'a dyn QueryAnalyzer,
    resolver: Option<&'a dyn ModuleResolver>,
    base: Option<&'a Path>,
}

impl<'a> SymbolExtractor<'a> {
    pub fn new(analyzer: &'a dyn QueryAnalyzer) -> Self {
        Self {
            analyzer,
            resolver: None,
            base: None,
        }
    }

    /// Resolve imports through `resolver`, relative to the document at `base`
    pub fn with_resolver(mut self, resolver: &'a dyn ModuleResolver, base: Option<&'a Path>) -> Self {
        self.resolver = Some(resolver);
        self.base = base;
        self
    }

    /// Extract every identifiable node. Nodes missing their name or path,
    /// such as recovery placeholders, contribute nothing.
    pub fn extract(&self, suite: &Suite) -> SymbolTable {
        let mut table = SymbolTable::new();

        for import in &suite.imports {
            if let Some(symbol) = self.import_symbol(import) {
                table.insert_import(symbol);
            }
        }

        for query in suite.queries.iter().filter(|q| !q.name.is_empty()) {
            table.insert_query(self.query_symbol(&query.name, &query.body, Some(query.span)));
        }

        for scope in suite.scopes.iter().filter(|s| !s.query.is_empty()) {
            let mut groups = Vec::new();
            collect_tests(&mut table, &scope.query, &mut groups, &scope.items);
        }

        trace!(
            imports = table.imports.len(),
            queries = table.queries.len(),
            tests = table.tests.len(),
            "extracted symbols"
        );
        table
    }

    pub(crate) fn import_symbol(&self, import: &Import) -> Option<ImportSymbol> {
        if import.path.is_empty() {
            return None;
        }
        let alias = import.alias()?.to_string();
        let mut symbol = ImportSymbol {
            alias,
            path: import.path.clone(),
            span: Some(import.span),
            ..Default::default()
        };

        if let Some(resolver) = self.resolver {
            let path = resolver.resolve_import_path(self.base, &import.path);
            if let Some(exports) = resolver.load_module(&path) {
                symbol.queries = exports.queries;
                symbol.resolved = Some(path);
            }
        }
        Some(symbol)
    }

    pub(crate) fn query_symbol(&self, name: &str, body: &str, span: Option<Span>) -> QuerySymbol {
        QuerySymbol {
            name: name.to_string(),
            params: self.analyzer.params(body),
            returns: self.analyzer.returns(body),
            body: body.to_string(),
            span,
        }
    }
}

fn collect_tests(table: &mut SymbolTable, scope: &str, groups: &mut Vec<String>, items: &[TestOrGroup]) {
    for item in items {
        match item {
            TestOrGroup::Test(test) => {
                if !test.name.is_empty() {
                    table.insert_test(TestSymbol::new(scope, groups, &test.name, test.span));
                }
            }
            TestOrGroup::Group(group) => {
                if group.name.is_empty() {
                    continue;
                }
                groups.push(group.name.clone());
                collect_tests(table, scope, groups, &group.items);
                groups.pop();
            }
        }
    }
}
