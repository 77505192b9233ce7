//! Token lookup around a cursor

use std::cmp::Ordering;

use rehearse_ast::{Position, Suite, Token, TokenKind};

fn is_candidate(token: &Token) -> bool {
    !token.is_trivia() && token.kind != TokenKind::Eof && !token.text.is_empty()
}

/// The nearest significant token ending at or before `pos`.
///
/// Positions compare by line and column only, so an editor cursor without a
/// byte offset works.
pub fn previous_token(suite: &Suite, pos: Position) -> Option<&Token> {
    suite
        .tokens
        .iter()
        .filter(|t| is_candidate(t) && !t.end().is_after(&pos))
        .max_by(|a, b| a.pos.cmp_loc(&b.pos))
}

/// The significant token starting at or before `pos` and ending after it
pub fn token_at(suite: &Suite, pos: Position) -> Option<&Token> {
    suite.tokens.iter().filter(|t| is_candidate(t)).find(|t| {
        t.pos.cmp_loc(&pos) != Ordering::Greater && t.end().is_after(&pos)
    })
}
