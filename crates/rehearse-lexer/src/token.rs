//! Lexeme definitions for rehearse

use logos::Logos;
use rehearse_ast::TokenKind;

/// Raw scanner output. Whitespace and comments are emitted, not skipped,
/// so the parser can collect them as trivia.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lexeme {
    // === Keywords ===
    #[token("import")]
    Import,
    #[token("query")]
    Query,
    #[token("setup")]
    Setup,
    #[token("teardown")]
    Teardown,
    #[token("test")]
    Test,
    #[token("group")]
    Group,
    #[token("assert")]
    Assert,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    // === Operators ===
    #[token("==")]
    EqEq,
    #[token("!=")]
    Ne,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("!")]
    Bang,
    #[token("=")]
    Eq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    // === Delimiters ===
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    // === Punctuation ===
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token(".")]
    Dot,

    // === Literals ===
    #[regex(r"-?[0-9]+(\.[0-9]+)?")]
    Number,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    String,

    // Longest match picks the terminated form when the closing backtick exists.
    #[regex(r"`[^`]*`")]
    RawString,
    #[regex(r"`[^`]*")]
    UnterminatedRaw,

    // === Identifiers ===
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    #[regex(r"\$[a-zA-Z0-9_]*")]
    Ident,

    // === Trivia ===
    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,
    #[regex(r"//[^\n]*")]
    Comment,
}

impl Lexeme {
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            Lexeme::Import
                | Lexeme::Query
                | Lexeme::Setup
                | Lexeme::Teardown
                | Lexeme::Test
                | Lexeme::Group
                | Lexeme::Assert
                | Lexeme::True
                | Lexeme::False
                | Lexeme::Null
        )
    }

    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            Lexeme::EqEq
                | Lexeme::Ne
                | Lexeme::Le
                | Lexeme::Ge
                | Lexeme::Lt
                | Lexeme::Gt
                | Lexeme::AndAnd
                | Lexeme::OrOr
                | Lexeme::Bang
                | Lexeme::Eq
                | Lexeme::Plus
                | Lexeme::Minus
                | Lexeme::Star
                | Lexeme::Slash
                | Lexeme::Percent
        )
    }

    /// Coarse kind handed to the parser
    pub fn kind(&self) -> TokenKind {
        if self.is_keyword() {
            return TokenKind::Keyword;
        }
        if self.is_operator() {
            return TokenKind::Operator;
        }
        match self {
            Lexeme::LParen => TokenKind::LParen,
            Lexeme::RParen => TokenKind::RParen,
            Lexeme::LBrace => TokenKind::LBrace,
            Lexeme::RBrace => TokenKind::RBrace,
            Lexeme::LBracket => TokenKind::LBracket,
            Lexeme::RBracket => TokenKind::RBracket,
            Lexeme::Comma => TokenKind::Comma,
            Lexeme::Colon => TokenKind::Colon,
            Lexeme::Semicolon => TokenKind::Semicolon,
            Lexeme::Dot => TokenKind::Dot,
            Lexeme::Number => TokenKind::Number,
            Lexeme::String => TokenKind::String,
            Lexeme::RawString => TokenKind::RawString,
            Lexeme::UnterminatedRaw => TokenKind::UnterminatedRaw,
            Lexeme::Ident => TokenKind::Ident,
            Lexeme::Whitespace => TokenKind::Whitespace,
            Lexeme::Comment => TokenKind::Comment,
            _ => TokenKind::Error,
        }
    }
}
