//! Rehearse Lexer - Tokenization using logos
//!
//! Produces the complete token stream of a document, whitespace and
//! comments included, with line/column/offset positions on every token.
//! Characters the scanner does not recognise become `Error` tokens rather
//! than aborting the scan.

mod token;

pub use token::*;

use logos::Logos;
use rehearse_ast::{Position, Token, TokenKind};

/// Tokenize a source string. The last token is always `Eof`.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = Lexeme::lexer(source);
    let mut pos = Position::start();

    while let Some(result) = lexer.next() {
        let text = lexer.slice();
        let kind = match result {
            Ok(lexeme) => lexeme.kind(),
            Err(_) => TokenKind::Error,
        };
        tokens.push(Token::new(kind, text, pos));
        pos = pos.advance(text);
    }

    tokens.push(Token::new(TokenKind::Eof, "", pos));
    tokens
}

/// Tokens without whitespace and comments
pub fn significant(tokens: &[Token]) -> impl Iterator<Item = &Token> {
    tokens.iter().filter(|t| !t.is_trivia())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        significant(&tokenize(source)).map(|t| t.kind).collect()
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            kinds("import db \"./db.rh\""),
            vec![
                TokenKind::Keyword,
                TokenKind::Ident,
                TokenKind::String,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_parameter_is_identifier() {
        let tokens = tokenize("$id: 1");
        assert_eq!(tokens[0].kind, TokenKind::Ident);
        assert_eq!(tokens[0].text, "$id");
        assert_eq!(tokens[1].kind, TokenKind::Colon);
    }

    #[test]
    fn test_raw_string_terminated_and_not() {
        let tokens = tokenize("`MATCH (n)` `open");
        assert_eq!(tokens[0].kind, TokenKind::RawString);
        assert_eq!(tokens[0].text, "`MATCH (n)`");
        assert_eq!(tokens[2].kind, TokenKind::UnterminatedRaw);
        assert_eq!(tokens[2].text, "`open");
    }

    #[test]
    fn test_trivia_is_kept() {
        let tokens = tokenize("a // note\nb");
        let texts: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["a", " ", "// note", "\n", "b", ""]);
        assert_eq!(tokens[2].kind, TokenKind::Comment);
    }

    #[test]
    fn test_positions() {
        let tokens = tokenize("query Q\n  `x`");
        let raw = tokens
            .iter()
            .find(|t| t.kind == TokenKind::RawString)
            .unwrap();
        assert_eq!(raw.pos, Position::new(2, 3, 10));
        let eof = tokens.last().unwrap();
        assert_eq!(eof.kind, TokenKind::Eof);
        assert_eq!(eof.pos, Position::new(2, 6, 13));
    }

    #[test]
    fn test_operators_and_invalid_character() {
        assert_eq!(
            kinds("a == 1 && b @"),
            vec![
                TokenKind::Ident,
                TokenKind::Operator,
                TokenKind::Number,
                TokenKind::Operator,
                TokenKind::Ident,
                TokenKind::Error,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_comment_versus_slash() {
        let tokens = tokenize("a / b // c");
        assert_eq!(tokens[2].kind, TokenKind::Operator);
        assert_eq!(tokens[6].kind, TokenKind::Comment);
    }
}
