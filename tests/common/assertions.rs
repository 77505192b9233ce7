use rehearse_ast::*;
use rehearse_parser::{parse, parse_with_recovery, ParseError};

/// Assert that strict parsing succeeds and return the tree
pub fn assert_parses(source: &str) -> Suite {
    let output = parse(source);
    match output.suite {
        Some(suite) if output.error.is_none() => suite,
        _ => panic!("Expected source to parse, got {:?}", output.error),
    }
}

/// Assert that strict parsing fails while recovery still yields a tree
pub fn assert_recovers(source: &str) -> (Suite, ParseError) {
    assert!(parse(source).suite.is_none(), "Expected strict parse to fail");
    let (suite, error) = parse_with_recovery(source, true).into_parts();
    let suite = suite.expect("Expected recovery parse to produce a tree");
    let error = error.expect("Expected recovery parse to report an error");
    (suite, error)
}

/// Check that every child span lies within its parent, that siblings do not
/// overlap, and that `collect_spans` lists each node once in the same order.
pub fn assert_span_containment(suite: &Suite) {
    let mut checker = SpanChecker::default();
    checker.suite(suite);
    assert_eq!(checker.order, collect_spans(suite), "pre-order span list differs");
}

#[derive(Default)]
struct SpanChecker {
    order: Vec<Span>,
}

impl SpanChecker {
    fn node(&mut self, parent: Option<Span>, span: Span) {
        if let Some(parent) = parent {
            assert!(parent.encloses(&span), "{} escapes parent {}", span, parent);
        }
        self.order.push(span);
    }

    fn siblings(spans: &[Span]) {
        for pair in spans.windows(2) {
            assert!(
                !pair[1].start.is_before(&pair[0].end),
                "{} overlaps {}",
                pair[1],
                pair[0]
            );
        }
    }

    fn suite(&mut self, suite: &Suite) {
        let root = Some(suite.span);
        self.node(None, suite.span);
        for import in &suite.imports {
            self.node(root, import.span);
        }
        for query in &suite.queries {
            self.node(root, query.span);
        }
        if let Some(setup) = &suite.setup {
            self.setup(root, setup);
        }
        if let Some(teardown) = &suite.teardown {
            self.node(root, teardown.span);
        }
        for scope in &suite.scopes {
            let parent = Some(scope.span);
            self.node(root, scope.span);
            if let Some(setup) = &scope.setup {
                self.setup(parent, setup);
            }
            if let Some(teardown) = &scope.teardown {
                self.node(parent, teardown.span);
            }
            self.items(parent, &scope.items);
        }
        let scopes: Vec<_> = suite.scopes.iter().map(|s| s.span).collect();
        Self::siblings(&scopes);
    }

    fn items(&mut self, parent: Option<Span>, items: &[TestOrGroup]) {
        for item in items {
            match item {
                TestOrGroup::Group(group) => {
                    let inner = Some(group.span);
                    self.node(parent, group.span);
                    if let Some(setup) = &group.setup {
                        self.setup(inner, setup);
                    }
                    if let Some(teardown) = &group.teardown {
                        self.node(inner, teardown.span);
                    }
                    self.items(inner, &group.items);
                }
                TestOrGroup::Test(test) => self.test(parent, test),
            }
        }
        let spans: Vec<_> = items.iter().map(TestOrGroup::span).collect();
        Self::siblings(&spans);
    }

    fn test(&mut self, parent: Option<Span>, test: &Test) {
        let inner = Some(test.span);
        self.node(parent, test.span);
        if let Some(setup) = &test.setup {
            self.setup(inner, setup);
        }
        for stmt in &test.statements {
            self.node(inner, stmt.span);
            if let Some(value) = &stmt.value {
                self.value(Some(stmt.span), value);
            }
        }
        for assert in &test.asserts {
            self.node(inner, assert.span);
            if let Some(AssertQuery::Call(call)) = &assert.query {
                self.node(Some(assert.span), call.span);
            }
            for expr in &assert.exprs {
                self.node(Some(assert.span), expr.span);
            }
        }
        let statements: Vec<_> = test.statements.iter().map(|s| s.span).collect();
        Self::siblings(&statements);
    }

    fn setup(&mut self, parent: Option<Span>, setup: &SetupClause) {
        let inner = Some(setup.span);
        self.node(parent, setup.span);
        match &setup.body {
            Some(SetupBody::Call(call)) => self.node(inner, call.span),
            Some(SetupBody::Block(items)) => {
                for item in items {
                    self.node(inner, item.span);
                    if let Some(SetupItemKind::Call(call)) = &item.kind {
                        self.node(Some(item.span), call.span);
                    }
                }
            }
            Some(SetupBody::Inline(_)) | Some(SetupBody::Module(_)) | None => {}
        }
    }

    fn value(&mut self, parent: Option<Span>, value: &Value) {
        self.node(parent, value.span);
        match &value.kind {
            ValueKind::Literal(_) => {}
            ValueKind::Map(entries) => {
                for entry in entries {
                    self.value(Some(value.span), &entry.value);
                }
            }
            ValueKind::List(values) => {
                for v in values {
                    self.value(Some(value.span), v);
                }
            }
        }
    }
}
