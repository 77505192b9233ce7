//! Uniform node access and pre-order traversal
//!
//! Every node type is reached by the two walkers below. Adding a node type
//! means extending both, and the `match`es over the tagged unions keep that
//! obligation visible to the compiler.

use serde::{Deserialize, Serialize};

use crate::{
    Assert, AssertQuery, CommentMeta, Expr, Group, Import, Query, QueryScope, RecoveryMeta,
    SetupBody, SetupCall, SetupClause, SetupItem, SetupItemKind, Span, Statement, Suite, Teardown,
    Test, TestOrGroup, Value, ValueKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Suite,
    Import,
    Query,
    QueryScope,
    Group,
    Test,
    SetupClause,
    SetupItem,
    SetupCall,
    Teardown,
    Statement,
    Value,
    Assert,
    Expr,
}

/// Capabilities shared by every AST node
pub trait Node {
    fn kind(&self) -> NodeKind;
    fn span(&self) -> Span;
    fn comments(&self) -> &CommentMeta;
    fn comments_mut(&mut self) -> &mut CommentMeta;
    fn recovery(&self) -> &RecoveryMeta;

    /// The node's rule did not match cleanly and the parser resynchronised
    fn was_recovered(&self) -> bool {
        self.recovery().was_recovered()
    }
}

macro_rules! impl_node {
    ($($ty:ident),* $(,)?) => {
        $(
            impl Node for $ty {
                fn kind(&self) -> NodeKind {
                    NodeKind::$ty
                }
                fn span(&self) -> Span {
                    self.span
                }
                fn comments(&self) -> &CommentMeta {
                    &self.comments
                }
                fn comments_mut(&mut self) -> &mut CommentMeta {
                    &mut self.comments
                }
                fn recovery(&self) -> &RecoveryMeta {
                    &self.recovery
                }
            }
        )*
    };
}

impl_node!(
    Suite, Import, Query, QueryScope, Group, Test, SetupClause, SetupItem, SetupCall, Teardown,
    Statement, Value, Assert, Expr,
);

/// Visit every node of the tree in document order, parents before children.
pub fn walk<'a>(suite: &'a Suite, f: &mut dyn FnMut(&'a dyn Node)) {
    f(suite);
    for import in &suite.imports {
        f(import);
    }
    for query in &suite.queries {
        f(query);
    }
    if let Some(setup) = &suite.setup {
        walk_setup(setup, f);
    }
    if let Some(teardown) = &suite.teardown {
        f(teardown);
    }
    for scope in &suite.scopes {
        f(scope);
        if let Some(setup) = &scope.setup {
            walk_setup(setup, f);
        }
        if let Some(teardown) = &scope.teardown {
            f(teardown);
        }
        walk_items(&scope.items, f);
    }
}

fn walk_items<'a>(items: &'a [TestOrGroup], f: &mut dyn FnMut(&'a dyn Node)) {
    for item in items {
        match item {
            TestOrGroup::Group(group) => walk_group(group, f),
            TestOrGroup::Test(test) => walk_test(test, f),
        }
    }
}

fn walk_group<'a>(group: &'a Group, f: &mut dyn FnMut(&'a dyn Node)) {
    f(group);
    if let Some(setup) = &group.setup {
        walk_setup(setup, f);
    }
    if let Some(teardown) = &group.teardown {
        f(teardown);
    }
    walk_items(&group.items, f);
}

fn walk_test<'a>(test: &'a Test, f: &mut dyn FnMut(&'a dyn Node)) {
    f(test);
    if let Some(setup) = &test.setup {
        walk_setup(setup, f);
    }
    for stmt in &test.statements {
        f(stmt);
        if let Some(value) = &stmt.value {
            walk_value(value, f);
        }
    }
    for assert in &test.asserts {
        f(assert);
        match &assert.query {
            Some(AssertQuery::Call(call)) => f(call),
            Some(AssertQuery::Inline(_)) | None => {}
        }
        for expr in &assert.exprs {
            f(expr);
        }
    }
}

fn walk_setup<'a>(setup: &'a SetupClause, f: &mut dyn FnMut(&'a dyn Node)) {
    f(setup);
    match &setup.body {
        Some(SetupBody::Call(call)) => f(call),
        Some(SetupBody::Block(items)) => {
            for item in items {
                f(item);
                match &item.kind {
                    Some(SetupItemKind::Call(call)) => f(call),
                    Some(SetupItemKind::Inline(_)) | None => {}
                }
            }
        }
        Some(SetupBody::Inline(_)) | Some(SetupBody::Module(_)) | None => {}
    }
}

fn walk_value<'a>(value: &'a Value, f: &mut dyn FnMut(&'a dyn Node)) {
    f(value);
    match &value.kind {
        ValueKind::Literal(_) => {}
        ValueKind::Map(entries) => {
            for entry in entries {
                walk_value(&entry.value, f);
            }
        }
        ValueKind::List(values) => {
            for v in values {
                walk_value(v, f);
            }
        }
    }
}

/// Mutable counterpart of [`walk`], same order.
pub fn walk_mut(suite: &mut Suite, f: &mut dyn FnMut(&mut dyn Node)) {
    f(suite);
    for import in &mut suite.imports {
        f(import);
    }
    for query in &mut suite.queries {
        f(query);
    }
    if let Some(setup) = &mut suite.setup {
        walk_setup_mut(setup, f);
    }
    if let Some(teardown) = &mut suite.teardown {
        f(teardown);
    }
    for scope in &mut suite.scopes {
        f(scope);
        if let Some(setup) = &mut scope.setup {
            walk_setup_mut(setup, f);
        }
        if let Some(teardown) = &mut scope.teardown {
            f(teardown);
        }
        walk_items_mut(&mut scope.items, f);
    }
}

fn walk_items_mut(items: &mut [TestOrGroup], f: &mut dyn FnMut(&mut dyn Node)) {
    for item in items {
        match item {
            TestOrGroup::Group(group) => {
                f(group);
                if let Some(setup) = &mut group.setup {
                    walk_setup_mut(setup, f);
                }
                if let Some(teardown) = &mut group.teardown {
                    f(teardown);
                }
                walk_items_mut(&mut group.items, f);
            }
            TestOrGroup::Test(test) => walk_test_mut(test, f),
        }
    }
}

fn walk_test_mut(test: &mut Test, f: &mut dyn FnMut(&mut dyn Node)) {
    f(test);
    if let Some(setup) = &mut test.setup {
        walk_setup_mut(setup, f);
    }
    for stmt in &mut test.statements {
        f(stmt);
        if let Some(value) = &mut stmt.value {
            walk_value_mut(value, f);
        }
    }
    for assert in &mut test.asserts {
        f(assert);
        match &mut assert.query {
            Some(AssertQuery::Call(call)) => f(call),
            Some(AssertQuery::Inline(_)) | None => {}
        }
        for expr in &mut assert.exprs {
            f(expr);
        }
    }
}

fn walk_setup_mut(setup: &mut SetupClause, f: &mut dyn FnMut(&mut dyn Node)) {
    f(setup);
    match &mut setup.body {
        Some(SetupBody::Call(call)) => f(call),
        Some(SetupBody::Block(items)) => {
            for item in items {
                f(item);
                match &mut item.kind {
                    Some(SetupItemKind::Call(call)) => f(call),
                    Some(SetupItemKind::Inline(_)) | None => {}
                }
            }
        }
        Some(SetupBody::Inline(_)) | Some(SetupBody::Module(_)) | None => {}
    }
}

fn walk_value_mut(value: &mut Value, f: &mut dyn FnMut(&mut dyn Node)) {
    f(value);
    match &mut value.kind {
        ValueKind::Literal(_) => {}
        ValueKind::Map(entries) => {
            for entry in entries {
                walk_value_mut(&mut entry.value, f);
            }
        }
        ValueKind::List(values) => {
            for v in values {
                walk_value_mut(v, f);
            }
        }
    }
}

/// Span of every node in document order, the root first.
pub fn collect_spans(suite: &Suite) -> Vec<Span> {
    let mut spans = Vec::new();
    walk(suite, &mut |node| spans.push(node.span()));
    spans
}

/// Every node that recorded a recovery, in document order
pub fn recovered_nodes(suite: &Suite) -> Vec<&dyn Node> {
    let mut nodes = Vec::new();
    walk(suite, &mut |node| {
        if node.was_recovered() {
            nodes.push(node);
        }
    });
    nodes
}

/// Count nodes of each kind; used by tests and debug output.
pub fn node_count(suite: &Suite, kind: NodeKind) -> usize {
    let mut count = 0;
    walk(suite, &mut |node| {
        if node.kind() == kind {
            count += 1;
        }
    });
    count
}
