//! Document-level AST nodes: suite, imports, queries, scopes, groups, tests

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Assert, CommentMeta, RecoveryMeta, SetupClause, Span, Statement, Token};

/// Root of one parsed document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Suite {
    pub imports: Vec<Import>,
    pub queries: Vec<Query>,
    pub setup: Option<SetupClause>,
    pub teardown: Option<Teardown>,
    pub scopes: Vec<QueryScope>,
    /// Every token of the document, trivia included
    #[serde(skip)]
    pub tokens: Vec<Token>,
    pub span: Span,
    #[serde(default)]
    pub comments: CommentMeta,
    #[serde(default)]
    pub recovery: RecoveryMeta,
}

impl Suite {
    pub fn query(&self, name: &str) -> Option<&Query> {
        self.queries.iter().find(|q| q.name == name)
    }

    pub fn import(&self, alias: &str) -> Option<&Import> {
        self.imports.iter().find(|i| i.alias() == Some(alias))
    }
}

/// `import [alias] "path"`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Import {
    pub alias: Option<String>,
    pub path: String,
    pub span: Span,
    #[serde(default)]
    pub comments: CommentMeta,
    #[serde(default)]
    pub recovery: RecoveryMeta,
}

impl Import {
    /// The bound name: the explicit alias, or the file stem of the path.
    /// `None` when the node carries neither (recovery placeholder).
    pub fn alias(&self) -> Option<&str> {
        if let Some(alias) = self.alias.as_deref().filter(|a| !a.is_empty()) {
            return Some(alias);
        }
        Path::new(&self.path)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
    }
}

/// `query Name \`body\``
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Query {
    pub name: String,
    /// Raw query text between the backticks
    pub body: String,
    pub span: Span,
    #[serde(default)]
    pub comments: CommentMeta,
    #[serde(default)]
    pub recovery: RecoveryMeta,
}

/// `teardown \`body\``
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Teardown {
    pub body: Option<String>,
    pub span: Span,
    #[serde(default)]
    pub comments: CommentMeta,
    #[serde(default)]
    pub recovery: RecoveryMeta,
}

/// `QueryName { ... }`: tests exercising one query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryScope {
    pub query: String,
    pub setup: Option<SetupClause>,
    pub teardown: Option<Teardown>,
    pub items: Vec<TestOrGroup>,
    pub span: Span,
    #[serde(default)]
    pub comments: CommentMeta,
    #[serde(default)]
    pub recovery: RecoveryMeta,
}

/// `group "name" { ... }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub setup: Option<SetupClause>,
    pub teardown: Option<Teardown>,
    pub items: Vec<TestOrGroup>,
    pub span: Span,
    #[serde(default)]
    pub comments: CommentMeta,
    #[serde(default)]
    pub recovery: RecoveryMeta,
}

/// `test "name" { ... }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Test {
    pub name: String,
    pub setup: Option<SetupClause>,
    pub statements: Vec<Statement>,
    pub asserts: Vec<Assert>,
    pub span: Span,
    #[serde(default)]
    pub comments: CommentMeta,
    #[serde(default)]
    pub recovery: RecoveryMeta,
}

impl Test {
    /// Statements whose key is an input parameter (`$id: 1`)
    pub fn inputs(&self) -> impl Iterator<Item = &Statement> {
        self.statements.iter().filter(|s| s.is_input())
    }

    /// Statements describing expected output
    pub fn expectations(&self) -> impl Iterator<Item = &Statement> {
        self.statements.iter().filter(|s| !s.is_input())
    }
}

/// Member of a scope or group body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TestOrGroup {
    Test(Test),
    Group(Group),
}

impl TestOrGroup {
    pub fn span(&self) -> Span {
        match self {
            TestOrGroup::Test(test) => test.span,
            TestOrGroup::Group(group) => group.span,
        }
    }
}
