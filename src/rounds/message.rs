//! Locates the statement that hands the plaintext message to the cipher.

use crate::matcher::is_encryption_entry_point;
use crate::syntax::{NodeKind, SyntaxNode, SyntaxTree};
use serde::Serialize;

/// Where the message enters the cipher.
///
/// `name` is the identifier passed as the first argument of the call in the
/// entry point's first assignment; `start`/`end` are byte offsets of the whole
/// `return` statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageDescriptor {
    pub name: Option<String>,
    pub start: usize,
    pub end: usize,
}

/// Find the encryption entry point. When several statements match, the last
/// one in completion order wins. Returns `None` when nothing matches.
pub fn locate_message(tree: &SyntaxTree) -> Option<MessageDescriptor> {
    let found = tree
        .nodes()
        .filter(|n| is_encryption_entry_point(n))
        .last()
        .map(|node| MessageDescriptor {
            name: message_argument(node).map(str::to_string),
            start: node.span.start,
            end: node.span.end,
        });

    match &found {
        Some(m) => log::debug!("message entry point at {}..{} ({:?})", m.start, m.end, m.name),
        None => log::warn!("no encryption entry point found"),
    }
    found
}

/// `return c = f(msg, ...), ...` → `msg`.
fn message_argument(entry: &SyntaxNode) -> Option<&str> {
    let first = entry.expression()?.elements().first()?;
    let call = first.right().filter(|r| r.kind == NodeKind::Call)?;
    call.arguments().first()?.name()
}
