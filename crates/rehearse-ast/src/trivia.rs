//! Comment attachment
//!
//! Runs once per parsed tree, after parsing and before any analysis reads
//! [`CommentMeta`]. Comments are matched against the flattened span list from
//! [`collect_spans`] and the results applied back onto the nodes by span.

use std::collections::HashMap;

use tracing::trace;

use crate::{collect_spans, walk_mut, CommentMeta, NodeKind, Span, Suite, Trivia};

/// Attach every comment in `trivia` to the node it documents.
///
/// A comment on the same line as a node's end, after it, becomes that node's
/// trailing comment. Otherwise it leads the closest node that starts after
/// it. Comments with no following node are dropped. The root suite is never
/// a candidate.
pub fn attach_comments(suite: &mut Suite, trivia: &[Trivia]) {
    let spans = collect_spans(suite);
    let mut map = comment_map(spans.get(1..).unwrap_or_default(), trivia);
    if map.is_empty() {
        return;
    }

    // The first node visited with a given span receives its comments.
    walk_mut(suite, &mut |node| {
        if node.kind() == NodeKind::Suite {
            return;
        }
        if let Some(meta) = map.remove(&node.span()) {
            let target = node.comments_mut();
            target.leading.extend(meta.leading);
            if meta.trailing.is_some() {
                target.trailing = meta.trailing;
            }
        }
    });
}

/// Decide attachment for each comment against `spans` (document order).
pub fn comment_map(spans: &[Span], trivia: &[Trivia]) -> HashMap<Span, CommentMeta> {
    let mut map: HashMap<Span, CommentMeta> = HashMap::new();

    for item in trivia.iter().filter(|t| t.is_comment()) {
        if let Some(span) = trailing_target(spans, item) {
            trace!(comment = %item.text, node = %span, "trailing comment");
            map.entry(span).or_default().trailing = Some(item.comment_body().to_string());
            continue;
        }
        if let Some(span) = leading_target(spans, item) {
            trace!(comment = %item.text, node = %span, "leading comment");
            map.entry(span)
                .or_default()
                .leading
                .push(item.comment_body().to_string());
        }
    }

    map
}

fn trailing_target(spans: &[Span], comment: &Trivia) -> Option<Span> {
    let start = comment.span.start;
    spans
        .iter()
        .find(|span| span.end.line == start.line && span.end.byte_offset <= start.byte_offset)
        .copied()
}

fn leading_target(spans: &[Span], comment: &Trivia) -> Option<Span> {
    let end = comment.span.end;
    let mut best: Option<Span> = None;
    for span in spans {
        if span.start.byte_offset < end.byte_offset {
            continue;
        }
        match best {
            Some(current) if current.start.byte_offset <= span.start.byte_offset => {}
            _ => best = Some(*span),
        }
    }
    best
}
