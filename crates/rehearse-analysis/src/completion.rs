//! Completion context resolution
//!
//! Works out what the user is typing at a cursor, even inside a document
//! that does not parse. Three strategies are tried in order and the first
//! answer wins:
//!
//! 1. **Recovered node.** Find the node whose recovery interval holds the
//!    cursor and pattern-match the tokens the parser skipped there.
//! 2. **Parse error.** When the cursor sits near the first parse error,
//!    classify by the single token before the cursor.
//! 3. **Ambient tokens.** Inside a query scope, look at the token before
//!    the cursor in an otherwise healthy document.
//!
//! Every strategy degrades to `None`; nothing here fails.

use rehearse_ast::{
    AssertQuery, Group, Node, NodeKind, Position, RecoveryMeta, SetupBody, SetupClause,
    SetupItemKind, Suite, Test, TestOrGroup, Token, TokenKind,
};
use rehearse_symbols::SymbolTable;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::cursor::{previous_token, token_at};
use crate::AnalyzedFile;

/// Columns either side of a parse error that still count as near it
const NEAR_ERROR_COLUMNS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionKind {
    /// An import alias, after `setup`
    ModuleAlias,
    /// A query of a module, after `alias.`
    Function,
    /// A `$parameter`
    Parameter,
    /// A field returned by the scope's query, as a test statement key
    ReturnField,
    Keyword,
}

/// What to complete at a cursor, and the text already typed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionContext {
    pub kind: CompletionKind,
    /// Partial text to filter candidates with
    pub prefix: String,
    /// Module whose queries to offer, for [`CompletionKind::Function`]
    pub module_alias: Option<String>,
    pub in_setup: bool,
    pub in_test: bool,
    pub in_assert: bool,
    /// Query named by the enclosing scope
    pub query_scope: Option<String>,
    /// Parse error the context was derived from
    pub error_pos: Option<Position>,
    /// Significant token before the cursor
    pub prev_token: Option<Token>,
}

impl CompletionContext {
    fn new(kind: CompletionKind, prefix: impl Into<String>, flags: Flags<'_>) -> Self {
        Self {
            kind,
            prefix: prefix.into(),
            module_alias: None,
            in_setup: flags.in_setup,
            in_test: flags.in_test,
            in_assert: flags.in_assert,
            query_scope: flags.scope.map(str::to_string),
            error_pos: None,
            prev_token: None,
        }
    }

    fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.module_alias = Some(alias.into());
        self
    }
}

/// Where a node sits, accumulated on the way down the tree
#[derive(Debug, Clone, Copy, Default)]
struct Flags<'a> {
    in_setup: bool,
    in_test: bool,
    in_assert: bool,
    scope: Option<&'a str>,
}

impl<'a> Flags<'a> {
    fn setup(self) -> Self {
        Self {
            in_setup: true,
            ..self
        }
    }

    fn test(self) -> Self {
        Self {
            in_test: true,
            ..self
        }
    }

    fn assert(self) -> Self {
        Self {
            in_assert: true,
            ..self
        }
    }

    fn scope(self, name: &'a str) -> Self {
        Self {
            scope: Some(name),
            ..self
        }
    }
}

/// Resolve the completion context at `pos`
pub fn completion_context(file: &AnalyzedFile, pos: Position) -> Option<CompletionContext> {
    let symbols = &file.symbols;

    if let Some(ctx) = from_recovered_node(file, symbols, pos) {
        debug!(strategy = "recovered-node", kind = ?ctx.kind, prefix = %ctx.prefix, "completion context");
        return Some(ctx);
    }
    if let Some(ctx) = from_parse_error(file, symbols, pos) {
        debug!(strategy = "parse-error", kind = ?ctx.kind, prefix = %ctx.prefix, "completion context");
        return Some(ctx);
    }
    if let Some(ctx) = from_ambient_tokens(file, symbols, pos) {
        debug!(strategy = "ambient", kind = ?ctx.kind, prefix = %ctx.prefix, "completion context");
        return Some(ctx);
    }
    trace!(%pos, "no completion context");
    None
}

// === 1. Recovered nodes ===

struct Found<'a> {
    kind: NodeKind,
    region: &'a RecoveryMeta,
    flags: Flags<'a>,
}

/// Finds the recovered node holding the cursor. Later visits overwrite
/// earlier ones, so the deepest match wins.
struct RecoverySearch<'a> {
    pos: Position,
    found: Option<Found<'a>>,
}

impl<'a> RecoverySearch<'a> {
    fn visit(&mut self, node: &'a dyn Node, flags: Flags<'a>) {
        if let Some(region) = node.recovery().region_at(self.pos) {
            trace!(kind = ?node.kind(), "cursor inside recovered node");
            self.found = Some(Found {
                kind: node.kind(),
                region,
                flags,
            });
        }
    }

    fn suite(&mut self, suite: &'a Suite) {
        let flags = Flags::default();
        self.visit(suite, flags);
        for import in &suite.imports {
            self.visit(import, flags);
        }
        for query in &suite.queries {
            self.visit(query, flags);
        }
        if let Some(setup) = &suite.setup {
            self.setup(setup, flags.setup());
        }
        if let Some(teardown) = &suite.teardown {
            self.visit(teardown, flags);
        }
        for scope in &suite.scopes {
            let flags = flags.scope(&scope.query);
            self.visit(scope, flags);
            if let Some(setup) = &scope.setup {
                self.setup(setup, flags.setup());
            }
            if let Some(teardown) = &scope.teardown {
                self.visit(teardown, flags);
            }
            self.items(&scope.items, flags);
        }
    }

    fn items(&mut self, items: &'a [TestOrGroup], flags: Flags<'a>) {
        for item in items {
            match item {
                TestOrGroup::Test(test) => self.test(test, flags.test()),
                TestOrGroup::Group(group) => self.group(group, flags),
            }
        }
    }

    fn group(&mut self, group: &'a Group, flags: Flags<'a>) {
        self.visit(group, flags);
        if let Some(setup) = &group.setup {
            self.setup(setup, flags.setup());
        }
        if let Some(teardown) = &group.teardown {
            self.visit(teardown, flags);
        }
        self.items(&group.items, flags);
    }

    fn test(&mut self, test: &'a Test, flags: Flags<'a>) {
        self.visit(test, flags);
        if let Some(setup) = &test.setup {
            self.setup(setup, flags.setup());
        }
        for stmt in &test.statements {
            self.visit(stmt, flags);
        }
        for assert in &test.asserts {
            let flags = flags.assert();
            self.visit(assert, flags);
            if let Some(AssertQuery::Call(call)) = &assert.query {
                self.visit(call, flags);
            }
        }
    }

    fn setup(&mut self, setup: &'a SetupClause, flags: Flags<'a>) {
        self.visit(setup, flags);
        match &setup.body {
            Some(SetupBody::Call(call)) => self.visit(call, flags),
            Some(SetupBody::Block(items)) => {
                for item in items {
                    self.visit(item, flags);
                    if let Some(SetupItemKind::Call(call)) = &item.kind {
                        self.visit(call, flags);
                    }
                }
            }
            Some(SetupBody::Inline(_)) | Some(SetupBody::Module(_)) | None => {}
        }
    }
}

fn from_recovered_node(
    file: &AnalyzedFile,
    symbols: &SymbolTable,
    pos: Position,
) -> Option<CompletionContext> {
    let tree = file.recovery_suite.as_ref().or(file.suite.as_ref())?;
    let mut search = RecoverySearch { pos, found: None };
    search.suite(tree);
    let Found { kind, region, flags } = search.found?;

    let skipped: Vec<&Token> = region.significant().collect();
    let mut ctx = classify_skipped(kind, &skipped, flags, symbols)?;
    ctx.error_pos = region.recovered_span;
    ctx.prev_token = previous_token(tree, pos).cloned();
    Some(ctx)
}

/// Match the skipped tokens of a recovered node against the known shapes
/// of partially typed input, most specific first.
fn classify_skipped(
    kind: NodeKind,
    tokens: &[&Token],
    flags: Flags<'_>,
    symbols: &SymbolTable,
) -> Option<CompletionContext> {
    let Some(first) = tokens.first() else {
        return match kind {
            NodeKind::SetupClause | NodeKind::SetupCall | NodeKind::SetupItem => {
                Some(CompletionContext::new(CompletionKind::ModuleAlias, "", flags))
            }
            NodeKind::Statement if flags.in_test => {
                Some(CompletionContext::new(CompletionKind::ReturnField, "", flags))
            }
            _ if flags.in_test => Some(CompletionContext::new(CompletionKind::Keyword, "", flags)),
            _ => None,
        };
    };

    // `alias . [Partial]`
    for (i, window) in tokens.windows(2).enumerate() {
        let (alias, dot) = (window[0], window[1]);
        if dot.kind == TokenKind::Dot && alias.kind == TokenKind::Ident && symbols.is_alias(&alias.text) {
            let prefix = tokens
                .get(i + 2)
                .filter(|t| t.kind == TokenKind::Ident)
                .map(|t| t.text.as_str())
                .unwrap_or("");
            return Some(
                CompletionContext::new(CompletionKind::Function, prefix, flags).with_alias(&alias.text),
            );
        }
    }

    // `setup [partial]`
    if let Some(i) = tokens.iter().position(|t| t.is_keyword("setup")) {
        let prefix = tokens
            .get(i + 1)
            .filter(|t| t.kind == TokenKind::Ident && !t.is_parameter())
            .map(|t| t.text.as_str())
            .unwrap_or("");
        return Some(CompletionContext::new(CompletionKind::ModuleAlias, prefix, flags));
    }

    if let Some(param) = tokens.iter().find(|t| t.is_parameter()) {
        return Some(CompletionContext::new(CompletionKind::Parameter, &param.text, flags));
    }

    if flags.in_test && first.kind == TokenKind::Ident {
        return Some(CompletionContext::new(CompletionKind::ReturnField, &first.text, flags));
    }

    let prefix = tokens
        .iter()
        .rev()
        .find(|t| t.is_ident_like())
        .map(|t| t.text.as_str())
        .unwrap_or("");
    Some(CompletionContext::new(CompletionKind::Keyword, prefix, flags))
}

// === 2. Near a parse error ===

fn is_near(pos: Position, error: Position) -> bool {
    if pos.line == error.line {
        return pos.column.abs_diff(error.column) <= NEAR_ERROR_COLUMNS;
    }
    pos.line.abs_diff(error.line) == 1
}

fn from_parse_error(
    file: &AnalyzedFile,
    symbols: &SymbolTable,
    pos: Position,
) -> Option<CompletionContext> {
    let error = file.recovery_error.as_ref().or(file.parse_error.as_ref())?;
    let error_pos = error.position();
    if !is_near(pos, error_pos) {
        trace!(%pos, %error_pos, "cursor far from parse error");
        return None;
    }

    let tree = file.recovery_suite.as_ref().or(file.suite.as_ref())?;
    let prev = previous_token(tree, pos)?;
    let flags = enclosing(tree, pos);

    let ctx = if prev.is_keyword("setup") {
        CompletionContext::new(CompletionKind::ModuleAlias, "", flags)
    } else if prev.kind == TokenKind::Dot {
        // A lone dot does not say which module it follows
        CompletionContext::new(CompletionKind::Function, "", flags)
    } else if prev.kind == TokenKind::Ident && symbols.is_alias(&prev.text) {
        CompletionContext::new(CompletionKind::Function, "", flags).with_alias(&prev.text)
    } else if prev.kind == TokenKind::Ident {
        CompletionContext::new(CompletionKind::ModuleAlias, &prev.text, flags)
    } else {
        return None;
    };

    Some(CompletionContext {
        error_pos: Some(error_pos),
        prev_token: Some(prev.clone()),
        ..ctx
    })
}

// === 3. Ambient tokens ===

fn from_ambient_tokens(
    file: &AnalyzedFile,
    symbols: &SymbolTable,
    pos: Position,
) -> Option<CompletionContext> {
    let tree = file.suite.as_ref().or(file.recovery_suite.as_ref())?;
    let flags = enclosing(tree, pos);
    flags.scope?;

    let prev = previous_token(tree, pos)?;
    let before = previous_token(tree, prev.pos);
    let touching = prev.end().cmp_loc(&pos).is_eq();
    let is_alias = |t: &Token| t.kind == TokenKind::Ident && symbols.is_alias(&t.text);

    let ctx = if prev.is_keyword("setup") {
        CompletionContext::new(CompletionKind::ModuleAlias, "", flags)
    } else if prev.kind == TokenKind::Dot && before.is_some_and(is_alias) {
        let alias = before.map(|t| t.text.as_str()).unwrap_or_default();
        CompletionContext::new(CompletionKind::Function, "", flags).with_alias(alias)
    } else if is_alias(prev) && token_at(tree, pos).is_some_and(|t| t.kind == TokenKind::Dot) {
        CompletionContext::new(CompletionKind::Function, "", flags).with_alias(&prev.text)
    } else if touching && prev.kind == TokenKind::Ident && !prev.is_parameter() {
        // Still typing a name: `setup par|` or `alias.Par|`
        let before = before?;
        if before.is_keyword("setup") {
            CompletionContext::new(CompletionKind::ModuleAlias, &prev.text, flags)
        } else if before.kind == TokenKind::Dot {
            let alias = previous_token(tree, before.pos).filter(|t| is_alias(*t))?;
            CompletionContext::new(CompletionKind::Function, &prev.text, flags).with_alias(&alias.text)
        } else {
            return None;
        }
    } else {
        return None;
    };

    Some(CompletionContext {
        prev_token: Some(prev.clone()),
        ..ctx
    })
}

/// Flags for the innermost nodes whose spans hold `pos`
fn enclosing(suite: &Suite, pos: Position) -> Flags<'_> {
    let mut flags = Flags::default();
    if suite.setup.as_ref().is_some_and(|s| s.span.contains(pos)) {
        flags.in_setup = true;
    }
    let Some(scope) = suite.scopes.iter().find(|s| s.span.contains(pos)) else {
        return flags;
    };
    flags = flags.scope(&scope.query);
    if scope.setup.as_ref().is_some_and(|s| s.span.contains(pos)) {
        flags.in_setup = true;
    }
    enclosing_items(&scope.items, pos, flags)
}

fn enclosing_items<'a>(items: &'a [TestOrGroup], pos: Position, mut flags: Flags<'a>) -> Flags<'a> {
    for item in items.iter().filter(|i| i.span().contains(pos)) {
        match item {
            TestOrGroup::Group(group) => {
                if group.setup.as_ref().is_some_and(|s| s.span.contains(pos)) {
                    flags.in_setup = true;
                }
                return enclosing_items(&group.items, pos, flags);
            }
            TestOrGroup::Test(test) => {
                flags.in_test = true;
                if test.setup.as_ref().is_some_and(|s| s.span.contains(pos)) {
                    flags.in_setup = true;
                }
                if test.asserts.iter().any(|a| a.span.contains(pos)) {
                    flags.in_assert = true;
                }
                return flags;
            }
        }
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Analyzer;
    use indoc::indoc;
    use rehearse_ast::Span;
    use rehearse_symbols::ImportSymbol;

    fn analyze(source: &str) -> AnalyzedFile {
        Analyzer::default().analyze(None, source)
    }

    fn tok(kind: TokenKind, text: &str, line: u32, column: u32) -> Token {
        Token::new(kind, text, Position::at(line, column))
    }

    fn with_db_import() -> SymbolTable {
        let mut symbols = SymbolTable::new();
        symbols.insert_import(ImportSymbol {
            alias: "db".into(),
            path: "./db.rh".into(),
            ..Default::default()
        });
        symbols
    }

    /// A file whose recovery tree has one test holding `meta` on its setup
    fn file_with_recovered_setup(meta: RecoveryMeta) -> AnalyzedFile {
        let test = Test {
            name: "t".into(),
            setup: Some(SetupClause {
                span: meta.covered_span().unwrap_or_default(),
                recovery: meta,
                ..Default::default()
            }),
            span: Span::new(Position::at(2, 3), Position::at(4, 4)),
            ..Default::default()
        };
        let suite = Suite {
            scopes: vec![rehearse_ast::QueryScope {
                query: "Q".into(),
                items: vec![TestOrGroup::Test(test)],
                span: Span::new(Position::at(1, 1), Position::at(5, 2)),
                ..Default::default()
            }],
            span: Span::new(Position::start(), Position::at(6, 1)),
            ..Default::default()
        };
        AnalyzedFile {
            recovery_suite: Some(suite),
            symbols: with_db_import(),
            ..Default::default()
        }
    }

    #[test]
    fn test_setup_prefix_wins_over_nearby_error() {
        let meta = RecoveryMeta::new(
            Position::at(3, 5),
            Some(Position::at(4, 3)),
            vec![
                tok(TokenKind::Keyword, "setup", 3, 5),
                tok(TokenKind::Whitespace, " ", 3, 10),
                tok(TokenKind::Ident, "fi", 3, 11),
            ],
        );
        let mut file = file_with_recovered_setup(meta);
        file.recovery_error = Some(rehearse_parser::ParseError::UnexpectedEof {
            expected: "'}'".into(),
            span: Span::point(Position::at(3, 14)),
        });

        let ctx = completion_context(&file, Position::at(3, 13)).unwrap();
        assert_eq!(ctx.kind, CompletionKind::ModuleAlias);
        assert_eq!(ctx.prefix, "fi");
        assert!(ctx.in_setup);
        assert!(ctx.in_test);
        assert_eq!(ctx.query_scope.as_deref(), Some("Q"));
        assert_eq!(ctx.error_pos, Some(Position::at(3, 5)));
    }

    #[test]
    fn test_dot_after_alias() {
        let meta = RecoveryMeta::new(
            Position::at(3, 5),
            None,
            vec![
                tok(TokenKind::Ident, "db", 3, 5),
                tok(TokenKind::Dot, ".", 3, 7),
                tok(TokenKind::Ident, "Get", 3, 8),
            ],
        );
        let file = file_with_recovered_setup(meta);
        let ctx = completion_context(&file, Position::at(3, 11)).unwrap();
        assert_eq!(ctx.kind, CompletionKind::Function);
        assert_eq!(ctx.module_alias.as_deref(), Some("db"));
        assert_eq!(ctx.prefix, "Get");
    }

    #[test]
    fn test_dot_after_unknown_name_is_not_function() {
        let tokens = [
            tok(TokenKind::Ident, "rows", 3, 5),
            tok(TokenKind::Dot, ".", 3, 9),
        ];
        let refs: Vec<&Token> = tokens.iter().collect();
        let ctx = classify_skipped(NodeKind::Statement, &refs, Flags::default().test(), &with_db_import())
            .unwrap();
        assert_eq!(ctx.kind, CompletionKind::ReturnField);
        assert_eq!(ctx.prefix, "rows");
    }

    #[test]
    fn test_parameter_and_keyword_rules() {
        let symbols = SymbolTable::new();
        let param = [tok(TokenKind::Ident, "$us", 3, 5)];
        let refs: Vec<&Token> = param.iter().collect();
        let ctx = classify_skipped(NodeKind::Statement, &refs, Flags::default().test(), &symbols).unwrap();
        assert_eq!(ctx.kind, CompletionKind::Parameter);
        assert_eq!(ctx.prefix, "$us");

        let junk = [
            tok(TokenKind::Number, "42", 1, 7),
            tok(TokenKind::Ident, "gro", 1, 10),
        ];
        let refs: Vec<&Token> = junk.iter().collect();
        let ctx = classify_skipped(NodeKind::Suite, &refs, Flags::default(), &symbols).unwrap();
        assert_eq!(ctx.kind, CompletionKind::Keyword);
        assert_eq!(ctx.prefix, "gro");
    }

    #[test]
    fn test_empty_skipped_classified_by_node() {
        let symbols = SymbolTable::new();
        let none: Vec<&Token> = Vec::new();
        let flags = Flags::default();
        assert_eq!(
            classify_skipped(NodeKind::SetupCall, &none, flags, &symbols).map(|c| c.kind),
            Some(CompletionKind::ModuleAlias)
        );
        assert_eq!(
            classify_skipped(NodeKind::Statement, &none, flags.test(), &symbols).map(|c| c.kind),
            Some(CompletionKind::ReturnField)
        );
        assert_eq!(
            classify_skipped(NodeKind::Test, &none, flags.test(), &symbols).map(|c| c.kind),
            Some(CompletionKind::Keyword)
        );
        assert!(classify_skipped(NodeKind::QueryScope, &none, flags, &symbols).is_none());
    }

    #[test]
    fn test_deepest_recovered_node_wins() {
        // The test, its scope and its setup are all recovered to end of input
        let source = indoc! {r#"
            import db "./db.rh"
            query Q `MATCH (n) RETURN n`
            Q {
              test "t" {
                setup fi(
        "#};
        let file = analyze(source);
        let tree = file.recovery_suite.as_ref().unwrap();
        let TestOrGroup::Test(test) = &tree.scopes[0].items[0] else {
            panic!("expected a test");
        };
        assert!(tree.scopes[0].recovery.was_recovered());
        assert!(test.recovery.was_recovered());

        let ctx = completion_context(&file, Position::at(5, 13)).unwrap();
        assert_eq!(ctx.kind, CompletionKind::ModuleAlias);
        assert_eq!(ctx.prefix, "fi");
        assert!(ctx.in_setup);
    }

    #[test]
    fn test_parsed_setup_call_in_progress() {
        let source = indoc! {r#"
            import db "./db.rh"
            query Q `MATCH (n) RETURN n`
            Q {
              test "t" {
                setup db.Get(
              }
            }
        "#};
        let file = analyze(source);
        let ctx = completion_context(&file, Position::at(5, 17)).unwrap();
        assert_eq!(ctx.kind, CompletionKind::Function);
        assert_eq!(ctx.module_alias.as_deref(), Some("db"));
        assert_eq!(ctx.prefix, "Get");
        assert!(ctx.in_test);
    }

    #[test]
    fn test_near_error_uses_previous_token() {
        let source = "import db \"./db.rh\"\nquery Q `x`\nQ {\n  setup db\n  @\n}\n";
        let file = analyze(source);
        assert!(matches!(
            file.parse_error,
            Some(rehearse_parser::ParseError::InvalidCharacter { .. })
        ));

        // `setup db|` on the line above the stray character
        let ctx = completion_context(&file, Position::at(4, 11)).unwrap();
        assert_eq!(ctx.kind, CompletionKind::Function);
        assert_eq!(ctx.module_alias.as_deref(), Some("db"));
        assert_eq!(ctx.error_pos, Some(Position::new(5, 3, 49)));
        assert_eq!(ctx.query_scope.as_deref(), Some("Q"));

        // `setup |db`
        let ctx = completion_context(&file, Position::at(4, 9)).unwrap();
        assert_eq!(ctx.kind, CompletionKind::ModuleAlias);
        assert_eq!(ctx.prefix, "");
    }

    /// A file with only a token stream on line 3 of scope `Q` and a
    /// recovery error at `error_at`, so no recovered node holds the cursor
    fn file_near_error(tokens: Vec<Token>, error_at: Position) -> AnalyzedFile {
        let suite = Suite {
            scopes: vec![rehearse_ast::QueryScope {
                query: "Q".into(),
                span: Span::new(Position::at(2, 1), Position::at(5, 2)),
                ..Default::default()
            }],
            tokens,
            span: Span::new(Position::start(), Position::at(6, 1)),
            ..Default::default()
        };
        AnalyzedFile {
            recovery_suite: Some(suite),
            recovery_error: Some(rehearse_parser::ParseError::UnexpectedToken {
                expected: "identifier".into(),
                found: "'@'".into(),
                span: Span::point(error_at),
            }),
            symbols: with_db_import(),
            ..Default::default()
        }
    }

    #[test]
    fn test_near_error_lone_dot() {
        let file = file_near_error(
            vec![
                tok(TokenKind::Keyword, "setup", 3, 3),
                tok(TokenKind::Ident, "rows", 3, 9),
                tok(TokenKind::Dot, ".", 3, 13),
            ],
            Position::at(3, 16),
        );
        let ctx = completion_context(&file, Position::at(3, 14)).unwrap();
        assert_eq!(ctx.kind, CompletionKind::Function);
        assert!(ctx.module_alias.is_none());
        assert_eq!(ctx.prefix, "");
        assert_eq!(ctx.error_pos, Some(Position::at(3, 16)));
        assert_eq!(ctx.prev_token.map(|t| t.kind), Some(TokenKind::Dot));
    }

    #[test]
    fn test_near_error_unknown_name_is_module_prefix() {
        let file = file_near_error(
            vec![
                tok(TokenKind::Keyword, "setup", 3, 3),
                tok(TokenKind::Ident, "rows", 3, 9),
            ],
            Position::at(3, 16),
        );
        let ctx = completion_context(&file, Position::at(3, 13)).unwrap();
        assert_eq!(ctx.kind, CompletionKind::ModuleAlias);
        assert_eq!(ctx.prefix, "rows");
        assert!(ctx.module_alias.is_none());
        assert_eq!(ctx.query_scope.as_deref(), Some("Q"));
    }

    #[test]
    fn test_clean_code_between_two_errors() {
        let source = "import db \"./db.rh\"\n42\nquery Q `x`\nQ {\n  setup db.Seed()\n  test \"t\" { x: 1 }\n}\n@\n";
        let file = analyze(source);
        let tree = file.recovery_suite.as_ref().unwrap();
        assert_eq!(tree.recovery.regions().count(), 2);
        assert!(!tree.recovery.contains(Position::at(5, 12)));

        // `setup db.|Seed()`
        let ctx = completion_context(&file, Position::at(5, 12)).unwrap();
        assert_eq!(ctx.kind, CompletionKind::Function);
        assert_eq!(ctx.module_alias.as_deref(), Some("db"));
        assert_eq!(ctx.query_scope.as_deref(), Some("Q"));
    }

    #[test]
    fn test_is_near() {
        let error = Position::at(10, 20);
        assert!(is_near(Position::at(10, 30), error));
        assert!(!is_near(Position::at(10, 31), error));
        assert!(is_near(Position::at(11, 80), error));
        assert!(!is_near(Position::at(12, 20), error));
    }

    #[test]
    fn test_ambient_setup_and_dot() {
        let source = indoc! {r#"
            import db "./db.rh"
            query Q `MATCH (n) RETURN n`
            Q {
              setup db.Seed()
              test "t" {
                setup fi
              }
            }
        "#};
        let file = analyze(source);
        assert!(file.parse_error.is_none());

        // `setup db|.Seed()`: cursor on the dot
        let ctx = completion_context(&file, Position::at(4, 11)).unwrap();
        assert_eq!(ctx.kind, CompletionKind::Function);
        assert_eq!(ctx.module_alias.as_deref(), Some("db"));

        // `setup db.|Seed()`
        let ctx = completion_context(&file, Position::at(4, 12)).unwrap();
        assert_eq!(ctx.kind, CompletionKind::Function);
        assert_eq!(ctx.prefix, "");

        // `setup db.Seed|()`
        let ctx = completion_context(&file, Position::at(4, 16)).unwrap();
        assert_eq!(ctx.kind, CompletionKind::Function);
        assert_eq!(ctx.prefix, "Seed");
        assert_eq!(ctx.module_alias.as_deref(), Some("db"));

        // `setup fi|`
        let ctx = completion_context(&file, Position::at(6, 13)).unwrap();
        assert_eq!(ctx.kind, CompletionKind::ModuleAlias);
        assert_eq!(ctx.prefix, "fi");
        assert!(ctx.in_test);
        assert!(ctx.in_setup);
    }

    #[test]
    fn test_clean_document_far_from_context() {
        let source = indoc! {r#"
            import db "./db.rh"
            query Q `MATCH (n) RETURN n.name AS name`
            Q {
              test "t" {
                name: "Alice"
              }
            }
        "#};
        let file = analyze(source);
        assert!(file.diagnostics.is_empty());
        assert!(completion_context(&file, Position::at(5, 18)).is_none());
        // Outside any scope
        assert!(completion_context(&file, Position::at(2, 3)).is_none());
    }
}
