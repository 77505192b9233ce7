//! Setup clauses and query calls

use serde::{Deserialize, Serialize};

use crate::{CommentMeta, Literal, RecoveryMeta, Span};

/// `setup ...` at suite, scope, group or test level
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetupClause {
    /// `None` only on recovery placeholders
    pub body: Option<SetupBody>,
    pub span: Span,
    #[serde(default)]
    pub comments: CommentMeta,
    #[serde(default)]
    pub recovery: RecoveryMeta,
}

/// What a setup clause runs. Exactly one form per clause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SetupBody {
    /// ``setup `CREATE ...` ``
    Inline(String),
    /// `setup db`: run the module's own setup
    Module(String),
    /// `setup db.Seed(count: 3)`
    Call(SetupCall),
    /// `setup { ...; ... }`
    Block(Vec<SetupItem>),
}

/// One entry of a setup block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetupItem {
    pub kind: Option<SetupItemKind>,
    pub span: Span,
    #[serde(default)]
    pub comments: CommentMeta,
    #[serde(default)]
    pub recovery: RecoveryMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SetupItemKind {
    Inline(String),
    Call(SetupCall),
}

/// `[module.]Query(name: value, ...)`
///
/// A call without a module names a query of the same document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetupCall {
    pub module: Option<String>,
    pub query: String,
    pub params: Vec<Param>,
    pub span: Span,
    #[serde(default)]
    pub comments: CommentMeta,
    #[serde(default)]
    pub recovery: RecoveryMeta,
}

impl SetupCall {
    /// `module.Query` or `Query`
    pub fn qualified_name(&self) -> String {
        match &self.module {
            Some(module) => format!("{}.{}", module, self.query),
            None => self.query.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub value: ParamValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Literal(Literal),
    /// `$name`, stored without the sigil
    Variable(String),
    List(Vec<ParamValue>),
    Map(Vec<(String, ParamValue)>),
}
