//! Tokens and trivia as produced by the scanner

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Position, Span};

/// Reserved words of the language
pub const KEYWORDS: &[&str] = &[
    "import", "query", "setup", "teardown", "test", "group", "assert", "true", "false", "null",
];

/// Coarse token classification shared by the parser and the analysis passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// `name` or `$name`
    Ident,
    /// Double-quoted string literal
    String,
    /// Backtick-delimited query body
    RawString,
    /// Backtick body missing its closing delimiter
    UnterminatedRaw,
    Number,
    Keyword,
    Operator,
    Dot,
    Colon,
    Comma,
    Semicolon,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Whitespace,
    Comment,
    /// Character the scanner could not classify
    Error,
    Eof,
}

impl TokenKind {
    pub fn is_trivia(&self) -> bool {
        matches!(self, TokenKind::Whitespace | TokenKind::Comment)
    }

    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Ident => "identifier",
            TokenKind::String => "string",
            TokenKind::RawString => "query body",
            TokenKind::UnterminatedRaw => "unterminated query body",
            TokenKind::Number => "number",
            TokenKind::Keyword => "keyword",
            TokenKind::Operator => "operator",
            TokenKind::Dot => "'.'",
            TokenKind::Colon => "':'",
            TokenKind::Comma => "','",
            TokenKind::Semicolon => "';'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Comment => "comment",
            TokenKind::Error => "invalid character",
            TokenKind::Eof => "end of file",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A token with its text and start position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub pos: Position,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, pos: Position) -> Self {
        Self {
            kind,
            text: text.into(),
            pos,
        }
    }

    /// Position just past the token
    pub fn end(&self) -> Position {
        self.pos.advance(&self.text)
    }

    pub fn span(&self) -> Span {
        Span::new(self.pos, self.end())
    }

    pub fn is_trivia(&self) -> bool {
        self.kind.is_trivia()
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text == word
    }

    /// Identifier, keyword, or `$parameter`
    pub fn is_ident_like(&self) -> bool {
        matches!(self.kind, TokenKind::Ident | TokenKind::Keyword)
    }

    pub fn is_parameter(&self) -> bool {
        self.text.starts_with('$')
    }

    /// Human-readable form for error messages
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Keyword => format!("'{}'", self.text),
            TokenKind::Ident
            | TokenKind::String
            | TokenKind::Number
            | TokenKind::Operator
            | TokenKind::Error => format!("{} '{}'", self.kind.describe(), self.text),
            _ => self.kind.describe().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriviaKind {
    Comment,
    Whitespace,
}

/// A comment or whitespace run collected outside the grammar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trivia {
    pub kind: TriviaKind,
    pub text: String,
    pub span: Span,
    /// An empty line separates this item from the preceding code
    pub had_blank_line_before: bool,
}

impl Trivia {
    /// Build the trivia list from a token stream, in source order.
    pub fn collect(tokens: &[Token]) -> Vec<Trivia> {
        let mut trivia = Vec::new();
        let mut newlines_before = 0usize;

        for token in tokens {
            match token.kind {
                TokenKind::Whitespace => {
                    let newlines = token.text.matches('\n').count();
                    trivia.push(Trivia {
                        kind: TriviaKind::Whitespace,
                        text: token.text.clone(),
                        span: token.span(),
                        had_blank_line_before: newlines_before + newlines >= 2,
                    });
                    newlines_before += newlines;
                }
                TokenKind::Comment => {
                    trivia.push(Trivia {
                        kind: TriviaKind::Comment,
                        text: token.text.clone(),
                        span: token.span(),
                        had_blank_line_before: newlines_before >= 2,
                    });
                    newlines_before = 0;
                }
                _ => newlines_before = 0,
            }
        }

        trivia
    }

    pub fn is_comment(&self) -> bool {
        self.kind == TriviaKind::Comment
    }

    /// Comment text without the `//` marker and surrounding blanks
    pub fn comment_body(&self) -> &str {
        self.text
            .strip_prefix("//")
            .unwrap_or(&self.text)
            .trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(kind: TokenKind, text: &str, line: u32, column: u32) -> Token {
        Token::new(kind, text, Position::at(line, column))
    }

    #[test]
    fn test_token_end() {
        let token = tok(TokenKind::Ident, "abc", 2, 5);
        assert_eq!(token.end(), Position::new(2, 8, 3));
    }

    #[test]
    fn test_collect_marks_blank_lines() {
        let tokens = vec![
            tok(TokenKind::Ident, "a", 1, 1),
            tok(TokenKind::Whitespace, "\n\n", 1, 2),
            tok(TokenKind::Comment, "// detached", 3, 1),
            tok(TokenKind::Whitespace, "\n", 3, 12),
            tok(TokenKind::Comment, "// attached", 4, 1),
        ];
        let trivia = Trivia::collect(&tokens);
        let comments: Vec<_> = trivia.iter().filter(|t| t.is_comment()).collect();
        assert_eq!(comments.len(), 2);
        assert!(comments[0].had_blank_line_before);
        assert!(!comments[1].had_blank_line_before);
        assert_eq!(comments[0].comment_body(), "detached");
    }
}
