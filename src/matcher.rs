//! Structural shape predicates over the lowered syntax tree.
//!
//! Each predicate answers one yes/no question about a node. They are pure and
//! independent; the round extractors call them while walking so detection and
//! operand extraction happen in the same visit.

use crate::errors::WORDS_PER_GROUP;
use crate::syntax::{NodeKind, SyntaxNode};

/// A sequence needs more than this many elements to be the round-dispatch body.
pub const BIG_SWITCH_MIN_ELEMENTS: usize = 50;

/// Number of elements in the message-producing return sequence.
const ENTRY_POINT_ELEMENTS: usize = 3;

/// `return x = f(msg), y = ..., z`: the statement that triggers message
/// encryption. The first element must assign to a plain identifier and the
/// second must also be an assignment.
pub fn is_encryption_entry_point(node: &SyntaxNode) -> bool {
    if node.kind != NodeKind::ReturnStatement {
        return false;
    }
    let Some(seq) = node.expression().filter(|e| e.is_sequence()) else {
        return false;
    };
    let elements = seq.elements();
    elements.len() == ENTRY_POINT_ELEMENTS
        && elements[0].is_assignment()
        && elements[0].left().is_some_and(|target| target.is_identifier())
        && elements[1].is_assignment()
}

/// A sequence expression with more than [`BIG_SWITCH_MIN_ELEMENTS`] elements:
/// the fingerprint of the body holding all main rounds back to back.
pub fn is_big_switch_body(node: &SyntaxNode) -> bool {
    node.is_sequence() && node.elements().len() > BIG_SWITCH_MIN_ELEMENTS
}

/// Any two-sided node (assignment, binary, logical) whose right-hand side is
/// an `^` expression.
pub fn has_xor_right(node: &SyntaxNode) -> bool {
    node.right().is_some_and(|rhs| rhs.is_binary_op("^"))
}

/// `target = lhs ^ rhs`.
pub fn is_xor_round_step(node: &SyntaxNode) -> bool {
    node.is_assignment() && has_xor_right(node)
}

/// `target = lhs & rhs`.
pub fn is_mask_round_step(node: &SyntaxNode) -> bool {
    node.is_assignment() && node.right().is_some_and(|rhs| rhs.is_binary_op("&"))
}

/// `target = mask & (lhs ^ rhs)`: a mask step whose right operand is itself
/// an xor. Returns the xor node.
pub fn masked_xor(node: &SyntaxNode) -> Option<&SyntaxNode> {
    if !is_mask_round_step(node) {
        return None;
    }
    node.right()
        .and_then(|mask| mask.right())
        .filter(|inner| inner.is_binary_op("^"))
}

/// An expression statement whose sequence has exactly four elements: the
/// shape that computes the first round's key words.
pub fn is_candidate_round_expression_group(node: &SyntaxNode) -> bool {
    node.kind == NodeKind::ExpressionStatement
        && node
            .expression()
            .is_some_and(|e| e.is_sequence() && e.elements().len() == WORDS_PER_GROUP)
}
