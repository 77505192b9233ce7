//! Semantic checks over a clean strict tree
//!
//! Only run when the strict parse succeeded, so every node is complete and
//! no recovery placeholder can show up here.

use std::collections::HashSet;

use rehearse_ast::{
    AssertQuery, SetupBody, SetupCall, SetupClause, SetupItemKind, Span, Suite, TestOrGroup,
};
use rehearse_symbols::{SymbolTable, TestSymbol};
use tracing::debug;

use crate::Diagnostic;

pub const DUPLICATE_QUERY: &str = "duplicate-query";
pub const DUPLICATE_IMPORT: &str = "duplicate-import";
pub const UNKNOWN_QUERY: &str = "unknown-query";
pub const UNKNOWN_MODULE: &str = "unknown-module";
pub const DUPLICATE_TEST: &str = "duplicate-test";
pub const EMPTY_TEST: &str = "empty-test";
pub const UNRESOLVED_IMPORT: &str = "unresolved-import";

pub struct Validator<'a> {
    suite: &'a Suite,
    symbols: &'a SymbolTable,
    source: &'a str,
    check_imports: bool,
    seen_tests: HashSet<String>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Validator<'a> {
    pub fn new(suite: &'a Suite, symbols: &'a SymbolTable, source: &'a str) -> Self {
        Self {
            suite,
            symbols,
            source,
            check_imports: false,
            seen_tests: HashSet::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Report imports the resolver could not load
    pub fn check_imports(mut self, enabled: bool) -> Self {
        self.check_imports = enabled;
        self
    }

    pub fn validate(mut self) -> Vec<Diagnostic> {
        let suite = self.suite;

        let mut names = HashSet::new();
        for query in &suite.queries {
            if !names.insert(query.name.as_str()) {
                self.error(
                    query.span,
                    DUPLICATE_QUERY,
                    format!("query '{}' is defined more than once", query.name),
                );
            }
        }

        let mut aliases = HashSet::new();
        for import in &suite.imports {
            let Some(alias) = import.alias() else { continue };
            if !aliases.insert(alias) {
                self.error(
                    import.span,
                    DUPLICATE_IMPORT,
                    format!("import alias '{}' is bound more than once", alias),
                );
            } else if self.check_imports
                && self.symbols.import(alias).is_some_and(|s| s.resolved.is_none())
            {
                self.warning(
                    import.span,
                    UNRESOLVED_IMPORT,
                    format!("cannot load module '{}' imported as '{}'", import.path, alias),
                );
            }
        }

        if let Some(setup) = &suite.setup {
            self.check_setup(setup);
        }

        for scope in &suite.scopes {
            if suite.query(&scope.query).is_none() {
                self.error(
                    scope.span,
                    UNKNOWN_QUERY,
                    format!("unknown query '{}'", scope.query),
                );
            }
            if let Some(setup) = &scope.setup {
                self.check_setup(setup);
            }
            let mut groups = Vec::new();
            self.check_items(&scope.query, &mut groups, &scope.items);
        }

        debug!(diagnostics = self.diagnostics.len(), "validation finished");
        self.diagnostics
    }

    fn check_items(&mut self, scope: &str, groups: &mut Vec<String>, items: &[TestOrGroup]) {
        for item in items {
            match item {
                TestOrGroup::Test(test) => {
                    let path = TestSymbol::new(scope, groups, &test.name, test.span).path;
                    if !self.seen_tests.insert(path.clone()) {
                        self.warning(test.span, DUPLICATE_TEST, format!("duplicate test '{}'", path));
                    }
                    if test.statements.is_empty() && test.asserts.is_empty() {
                        self.warning(
                            test.span,
                            EMPTY_TEST,
                            format!("test '{}' has no statements or assertions", test.name),
                        );
                    }
                    if let Some(setup) = &test.setup {
                        self.check_setup(setup);
                    }
                    for assert in &test.asserts {
                        if let Some(AssertQuery::Call(call)) = &assert.query {
                            self.check_call(call);
                        }
                    }
                }
                TestOrGroup::Group(group) => {
                    if let Some(setup) = &group.setup {
                        self.check_setup(setup);
                    }
                    groups.push(group.name.clone());
                    self.check_items(scope, groups, &group.items);
                    groups.pop();
                }
            }
        }
    }

    fn check_setup(&mut self, setup: &SetupClause) {
        match &setup.body {
            Some(SetupBody::Module(alias)) => {
                if !self.symbols.is_alias(alias) {
                    self.error(setup.span, UNKNOWN_MODULE, format!("unknown module '{}'", alias));
                }
            }
            Some(SetupBody::Call(call)) => self.check_call(call),
            Some(SetupBody::Block(items)) => {
                for item in items {
                    if let Some(SetupItemKind::Call(call)) = &item.kind {
                        self.check_call(call);
                    }
                }
            }
            Some(SetupBody::Inline(_)) | None => {}
        }
    }

    fn check_call(&mut self, call: &SetupCall) {
        match &call.module {
            Some(module) => match self.symbols.import(module) {
                None => self.error(call.span, UNKNOWN_MODULE, format!("unknown module '{}'", module)),
                Some(import) if import.resolved.is_some() && !import.exports(&call.query) => self
                    .error(
                        call.span,
                        UNKNOWN_QUERY,
                        format!("module '{}' has no query '{}'", module, call.query),
                    ),
                Some(_) => {}
            },
            None => {
                if self.suite.query(&call.query).is_none() {
                    self.error(call.span, UNKNOWN_QUERY, format!("unknown query '{}'", call.query));
                }
            }
        }
    }

    fn error(&mut self, span: Span, code: &str, message: String) {
        self.diagnostics
            .push(Diagnostic::error(span, code, message).with_source(self.source));
    }

    fn warning(&mut self, span: Span, code: &str, message: String) {
        self.diagnostics
            .push(Diagnostic::warning(span, code, message).with_source(self.source));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use rehearse_parser::parse;
    use rehearse_symbols::build_symbol_table;

    fn codes(source: &str) -> Vec<String> {
        let suite = parse(source).suite.unwrap();
        let symbols = build_symbol_table(&suite);
        Validator::new(&suite, &symbols, "rehearse")
            .validate()
            .into_iter()
            .map(|d| d.code)
            .collect()
    }

    #[test]
    fn test_clean_suite_has_no_diagnostics() {
        let source = indoc! {r#"
            import db "./db.rh"
            query Q `MATCH (n) RETURN n`
            setup db
            Q {
              setup db.Seed(count: 1)
              test "t" {
                n: 1
                assert Q() { n > 0 }
              }
            }
        "#};
        assert!(codes(source).is_empty());
    }

    #[test]
    fn test_duplicates() {
        let source = indoc! {r#"
            import db "./a.rh"
            import db "./b.rh"
            query Q `A`
            query Q `B`
            Q {
              test "t" { x: 1 }
              test "t" { x: 2 }
            }
        "#};
        assert_eq!(
            codes(source),
            vec![DUPLICATE_QUERY, DUPLICATE_IMPORT, DUPLICATE_TEST]
        );
    }

    #[test]
    fn test_unknown_references() {
        let source = indoc! {r#"
            query Q `A`
            Missing {
              setup nope.Seed()
              test "t" {
                setup { Other() }
                assert nope {}
              }
            }
        "#};
        assert_eq!(
            codes(source),
            vec![UNKNOWN_QUERY, UNKNOWN_MODULE, UNKNOWN_QUERY, UNKNOWN_QUERY]
        );
    }

    #[test]
    fn test_empty_test_warning() {
        let source = "query Q `A`\nQ {\n  group g {\n    test \"t\" {}\n  }\n}\n";
        let suite = parse(source).suite.unwrap();
        let symbols = build_symbol_table(&suite);
        let diagnostics = Validator::new(&suite, &symbols, "rehearse").validate();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, EMPTY_TEST);
        assert!(!diagnostics[0].is_error());
    }
}
