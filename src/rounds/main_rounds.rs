//! Main-round key words.
//!
//! All thirteen main rounds sit back to back in one very long sequence
//! expression. Each key word enters through an assignment of the form
//! `t = state ^ key`, where `key` is the right operand of the xor.

use crate::errors::{MAIN_ROUNDS, WORDS_PER_GROUP};
use crate::expr::RoundKeyExpression;
use crate::matcher::{is_big_switch_body, is_xor_round_step};
use crate::syntax::{NodeKind, SyntaxNode, SyntaxTree};

/// Maximum number of main-round expressions kept.
pub const MAIN_ROUND_WORDS: usize = MAIN_ROUNDS * WORDS_PER_GROUP;

/// Collect up to [`MAIN_ROUND_WORDS`] main-round expressions in document order.
///
/// A script without a big-switch body yields an empty list.
pub fn extract_main_rounds(tree: &SyntaxTree) -> Vec<RoundKeyExpression> {
    let mut keys = Vec::with_capacity(MAIN_ROUND_WORDS);
    let mut bodies = 0;

    for body in tree.nodes().filter(|n| is_big_switch_body(n)) {
        bodies += 1;
        for step in body.elements().iter().filter(|e| is_xor_round_step(e)) {
            let operand = step.right().and_then(SyntaxNode::right);
            if let Some(expr) = operand.and_then(|op| xor_right_operand(tree, op)) {
                keys.push(expr);
            }
        }
    }

    if bodies == 0 {
        log::warn!("no big-switch body found; main rounds unavailable");
    }
    if keys.len() > MAIN_ROUND_WORDS {
        log::info!(
            "main rounds: {} candidates, keeping the first {MAIN_ROUND_WORDS}",
            keys.len()
        );
        keys.truncate(MAIN_ROUND_WORDS);
    }
    log::debug!("main rounds: {} expressions from {bodies} bodies", keys.len());
    keys
}

/// Symbolic form of the right operand of a main-round xor.
fn xor_right_operand(tree: &SyntaxTree, operand: &SyntaxNode) -> Option<RoundKeyExpression> {
    match &operand.kind {
        NodeKind::Unary { operator } => {
            let argument = operand.argument()?;
            match argument.left() {
                // -(qX + 1): only a named left side is usable
                Some(left) => left
                    .name()
                    .map(|name| RoundKeyExpression::signed(operator, name)),
                None => Some(RoundKeyExpression::source(&format!(
                    "{operator}{}",
                    tree.text(argument)
                ))),
            }
        }
        NodeKind::Identifier(_) => Some(RoundKeyExpression::source(tree.text(operand))),
        // the left side is the key-bearing term by construction
        NodeKind::Binary { .. } => operand
            .left()
            .map(|left| RoundKeyExpression::source(tree.text(left))),
        NodeKind::Program
        | NodeKind::ReturnStatement
        | NodeKind::ExpressionStatement
        | NodeKind::VariableDeclarator { .. }
        | NodeKind::Literal(_)
        | NodeKind::Logical { .. }
        | NodeKind::Assignment { .. }
        | NodeKind::Sequence
        | NodeKind::Call
        | NodeKind::Other => None,
    }
}
