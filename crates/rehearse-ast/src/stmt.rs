//! Test body statements and literal values

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{CommentMeta, RecoveryMeta, Span};

/// `key.path: value` inside a test.
///
/// A key starting with `$` binds an input parameter; any other key states an
/// expected output field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Statement {
    pub key: Vec<String>,
    /// `None` only on recovery placeholders
    pub value: Option<Value>,
    pub span: Span,
    #[serde(default)]
    pub comments: CommentMeta,
    #[serde(default)]
    pub recovery: RecoveryMeta,
}

impl Statement {
    pub fn is_input(&self) -> bool {
        self.key.first().is_some_and(|k| k.starts_with('$'))
    }

    /// Dotted key as written
    pub fn key_path(&self) -> String {
        self.key.join(".")
    }

    /// Parameter name without the sigil, for input statements
    pub fn param_name(&self) -> Option<&str> {
        self.key.first().and_then(|k| k.strip_prefix('$'))
    }
}

/// A literal, map or list value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Value {
    pub kind: ValueKind,
    pub span: Span,
    #[serde(default)]
    pub comments: CommentMeta,
    #[serde(default)]
    pub recovery: RecoveryMeta,
}

impl Value {
    pub fn new(kind: ValueKind, span: Span) -> Self {
        Self {
            kind,
            span,
            comments: CommentMeta::default(),
            recovery: RecoveryMeta::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ValueKind {
    Literal(Literal),
    Map(Vec<MapEntry>),
    List(Vec<Value>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapEntry {
    pub key: String,
    pub value: Value,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    String(String),
    Number(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "{:?}", s),
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Null => f.write_str("null"),
        }
    }
}
