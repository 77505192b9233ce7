//! Query body analysis
//!
//! The core treats query bodies as opaque. Parameter and return-field
//! extraction goes through [`QueryAnalyzer`] so a dialect-aware analyzer can
//! be plugged in; [`PatternAnalyzer`] is the built-in one, a textual scan that
//! understands `$parameters` and a Cypher-style `RETURN` clause.

use std::sync::LazyLock;

use regex::Regex;

static PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)").unwrap());

static RETURN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bRETURN\b").unwrap());

static RETURN_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:ORDER\s+BY|SKIP|LIMIT|UNION)\b").unwrap());

static DISTINCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*DISTINCT\b").unwrap());

static ALIAS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+AS\s+([A-Za-z_][A-Za-z0-9_]*)\s*$").unwrap());

static PROPERTY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*$").unwrap());

/// Extracts parameters and returned fields from a query body
pub trait QueryAnalyzer: Send + Sync {
    fn params(&self, body: &str) -> Vec<String>;
    fn returns(&self, body: &str) -> Vec<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PatternAnalyzer;

impl QueryAnalyzer for PatternAnalyzer {
    fn params(&self, body: &str) -> Vec<String> {
        scan_params(body)
    }

    fn returns(&self, body: &str) -> Vec<String> {
        scan_returns(body)
    }
}

/// `$identifier` names in first-seen order, without duplicates or sigils
pub fn scan_params(body: &str) -> Vec<String> {
    let mut params: Vec<String> = Vec::new();
    for caps in PARAM_RE.captures_iter(body) {
        let name = &caps[1];
        if !params.iter().any(|p| p == name) {
            params.push(name.to_string());
        }
    }
    params
}

/// Field names produced by the last `RETURN` clause.
///
/// `expr AS alias` yields `alias`; `node.prop` yields `prop`; any other
/// expression is kept as written.
pub fn scan_returns(body: &str) -> Vec<String> {
    let Some(last) = RETURN_RE.find_iter(body).last() else {
        return Vec::new();
    };
    let mut clause = &body[last.end()..];
    if let Some(end) = RETURN_END_RE.find(clause) {
        clause = &clause[..end.start()];
    }
    if let Some(distinct) = DISTINCT_RE.find(clause) {
        clause = &clause[distinct.end()..];
    }

    let mut fields: Vec<String> = Vec::new();
    for item in split_top_level(clause) {
        let item = item.trim().trim_end_matches(';').trim();
        if item.is_empty() || item == "*" {
            continue;
        }
        let field = if let Some(caps) = ALIAS_RE.captures(item) {
            caps[1].to_string()
        } else if PROPERTY_RE.is_match(item) {
            item.rsplit('.').next().unwrap_or(item).to_string()
        } else {
            item.to_string()
        };
        if !fields.contains(&field) {
            fields.push(field);
        }
    }
    fields
}

/// Split on commas outside brackets
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, ch) in text.char_indices() {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}
