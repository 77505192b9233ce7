//! Assertions and their token-level expressions
//!
//! Expressions are not parsed into a tree here. Each one is kept as the
//! sequence of tokens the user wrote and rebuilt into text for a separate
//! evaluator.

use serde::{Deserialize, Serialize};

use crate::{CommentMeta, RecoveryMeta, SetupCall, Span};

/// `assert [query] { expr ... }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Assert {
    /// Query run before evaluating; `None` checks the test's own result
    pub query: Option<AssertQuery>,
    pub exprs: Vec<Expr>,
    pub span: Span,
    #[serde(default)]
    pub comments: CommentMeta,
    #[serde(default)]
    pub recovery: RecoveryMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AssertQuery {
    /// ``assert `MATCH ...` { ... }``
    Inline(String),
    /// `assert db.Count(label: "User") { ... }`
    Call(SetupCall),
}

/// One boolean expression line of an assert body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Expr {
    pub tokens: Vec<ExprToken>,
    pub span: Span,
    #[serde(default)]
    pub comments: CommentMeta,
    #[serde(default)]
    pub recovery: RecoveryMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprToken {
    /// String contents, unquoted
    String(String),
    Number(String),
    Ident(String),
    Operator(String),
    Dot,
    Colon,
    Comma,
    /// One of `( ) [ ]`
    Bracket(char),
}

impl ExprToken {
    fn render(&self, out: &mut String) {
        match self {
            ExprToken::String(s) => {
                out.push('"');
                for ch in s.chars() {
                    if ch == '"' || ch == '\\' {
                        out.push('\\');
                    }
                    out.push(ch);
                }
                out.push('"');
            }
            ExprToken::Number(n) | ExprToken::Ident(n) | ExprToken::Operator(n) => out.push_str(n),
            ExprToken::Dot => out.push('.'),
            ExprToken::Colon => out.push(':'),
            ExprToken::Comma => out.push(','),
            ExprToken::Bracket(c) => out.push(*c),
        }
    }

    fn opens(&self) -> bool {
        matches!(self, ExprToken::Dot | ExprToken::Bracket('(') | ExprToken::Bracket('['))
            || matches!(self, ExprToken::Operator(op) if op == "!")
    }

    fn closes(&self) -> bool {
        matches!(
            self,
            ExprToken::Dot
                | ExprToken::Comma
                | ExprToken::Colon
                | ExprToken::Bracket(')')
                | ExprToken::Bracket(']')
        )
    }

    fn is_operand(&self) -> bool {
        matches!(
            self,
            ExprToken::Ident(_) | ExprToken::String(_) | ExprToken::Number(_)
        ) || matches!(self, ExprToken::Bracket(')') | ExprToken::Bracket(']'))
    }
}

impl Expr {
    /// Rebuild the expression source: `rows[0].name == "x"`
    pub fn text(&self) -> String {
        let mut out = String::new();
        let mut prev: Option<&ExprToken> = None;
        for token in &self.tokens {
            if let Some(p) = prev {
                let call_or_index = p.is_operand()
                    && matches!(token, ExprToken::Bracket('(') | ExprToken::Bracket('['));
                if !p.opens() && !token.closes() && !call_or_index {
                    out.push(' ');
                }
            }
            token.render(&mut out);
            prev = Some(token);
        }
        out
    }
}
