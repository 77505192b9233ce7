//! Per-node metadata filled in after (comments) or during (recovery) parsing

use serde::{Deserialize, Serialize};

use crate::{Position, Span, Token};

/// Comments attached to a node by [`attach_comments`](crate::attach_comments)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentMeta {
    /// Comments directly above the node, oldest first
    pub leading: Vec<String>,
    /// Comment on the node's last line, after the node
    pub trailing: Option<String>,
}

impl CommentMeta {
    pub fn is_empty(&self) -> bool {
        self.leading.is_empty() && self.trailing.is_none()
    }
}

/// Record of a grammar rule that did not match cleanly.
///
/// `recovered_span` is where the skipped region starts and `recovered_end`
/// where the parser resynchronised. A missing end means input ran out before
/// resynchronisation, so the region extends to the end of the buffer.
///
/// A node that recovers more than once keeps each later region in
/// `absorbed`, so clean code between two errors is never inside the node's
/// recovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryMeta {
    pub recovered_span: Option<Position>,
    pub recovered_end: Option<Position>,
    /// Tokens swallowed while resynchronising, trivia included
    pub skipped: Vec<Token>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub absorbed: Vec<RecoveryMeta>,
}

impl RecoveryMeta {
    pub fn new(start: Position, end: Option<Position>, skipped: Vec<Token>) -> Self {
        Self {
            recovered_span: Some(start),
            recovered_end: end,
            skipped,
            absorbed: Vec::new(),
        }
    }

    pub fn was_recovered(&self) -> bool {
        self.recovered_span.is_some()
    }

    /// Whether `pos` falls in this region alone: start inclusive, end
    /// exclusive, open-ended when no end was recorded.
    fn holds(&self, pos: Position) -> bool {
        let Some(start) = self.recovered_span else {
            return false;
        };
        if pos.is_before(&start) {
            return false;
        }
        match self.recovered_end {
            Some(end) => pos.is_before(&end),
            None => true,
        }
    }

    /// Every skipped region of the node, in source order
    pub fn regions(&self) -> impl Iterator<Item = &RecoveryMeta> {
        std::iter::once(self)
            .chain(self.absorbed.iter())
            .filter(|r| r.was_recovered())
    }

    /// Whether `pos` falls in any skipped region of the node
    pub fn contains(&self, pos: Position) -> bool {
        self.regions().any(|r| r.holds(pos))
    }

    /// The region holding `pos`. Open-ended regions can overlap, in which
    /// case the last one that skipped real tokens wins.
    pub fn region_at(&self, pos: Position) -> Option<&RecoveryMeta> {
        let mut found = None;
        for region in self.regions().filter(|r| r.holds(pos)) {
            let has_tokens = region.skipped.iter().any(|t| !t.is_trivia());
            if has_tokens || found.is_none() {
                found = Some(region);
            }
        }
        found
    }

    /// Skipped tokens that are not whitespace or comments, across every
    /// region
    pub fn significant(&self) -> impl Iterator<Item = &Token> {
        self.skipped
            .iter()
            .chain(self.absorbed.iter().flat_map(|r| r.skipped.iter()))
            .filter(|t| !t.is_trivia())
    }

    /// Extent of the skipped significant tokens
    pub fn covered_span(&self) -> Option<Span> {
        let first = self.significant().next()?;
        let last = self.significant().last()?;
        Some(Span::new(first.pos, last.end()))
    }

    /// Record a later recovery in the same node as a region of its own.
    pub fn absorb(&mut self, mut other: RecoveryMeta) {
        if other.recovered_span.is_none() {
            return;
        }
        if self.recovered_span.is_none() {
            *self = other;
            return;
        }
        let nested = std::mem::take(&mut other.absorbed);
        self.absorbed.push(other);
        self.absorbed.extend(nested);
    }
}
