//! First-round key words.
//!
//! The first round is computed by a single four-element expression statement
//! such as `a = -qX ^ m[0], b = Vb ^ m[1], c = (p + 3) ^ m[2], d = ~r ^ m[3]`.
//! The key-bearing term is the left operand of each xor.

use crate::errors::WORDS_PER_GROUP;
use crate::expr::RoundKeyExpression;
use crate::matcher::{has_xor_right, is_candidate_round_expression_group};
use crate::syntax::{NodeKind, SyntaxNode, SyntaxTree};

/// Collect the first four first-round expressions in document order.
///
/// Never pads: fewer than four results means the shape was not found often
/// enough, which the key table reports as missing slots.
pub fn extract_first_round(tree: &SyntaxTree) -> Vec<RoundKeyExpression> {
    let mut keys = Vec::with_capacity(WORDS_PER_GROUP);

    for group in tree.nodes().filter(|n| is_candidate_round_expression_group(n)) {
        let Some(seq) = group.expression() else {
            continue;
        };
        for step in seq.elements().iter().filter(|e| has_xor_right(e)) {
            let operand = step.right().and_then(SyntaxNode::left);
            if let Some(expr) = operand.and_then(|op| xor_left_operand(tree, op)) {
                log::debug!("first round candidate: {expr}");
                keys.push(expr);
            }
        }
    }

    if keys.len() > WORDS_PER_GROUP {
        log::info!(
            "first round: {} candidates, keeping the first {WORDS_PER_GROUP}",
            keys.len()
        );
        keys.truncate(WORDS_PER_GROUP);
    }
    keys
}

/// Symbolic form of the left operand of a first-round xor.
fn xor_left_operand(tree: &SyntaxTree, operand: &SyntaxNode) -> Option<RoundKeyExpression> {
    match &operand.kind {
        // (p + 3) ^ m  →  the nested expression's left side
        NodeKind::Binary { .. } | NodeKind::Logical { .. } | NodeKind::Assignment { .. } => operand
            .left()
            .map(|left| RoundKeyExpression::source(tree.text(left))),
        NodeKind::Unary { operator } => {
            let argument = operand.argument()?;
            match &argument.kind {
                // -(qX + 3) ^ m
                NodeKind::Binary { .. } | NodeKind::Logical { .. } | NodeKind::Assignment { .. } => {
                    let raw = tree.text(argument);
                    let mixed_signs = raw.contains('+') && raw.contains('-');
                    match argument.left().and_then(SyntaxNode::name) {
                        Some(name) if !mixed_signs => {
                            Some(RoundKeyExpression::signed(operator, name))
                        }
                        _ => Some(RoundKeyExpression::source(raw)),
                    }
                }
                // -qX ^ m  and  -~qX ^ m: keep the operators for the sign
                NodeKind::Identifier(_) | NodeKind::Unary { .. } => {
                    Some(RoundKeyExpression::source(tree.text(operand)))
                }
                _ => None,
            }
        }
        NodeKind::Identifier(_) => Some(RoundKeyExpression::source(tree.text(operand))),
        NodeKind::Program
        | NodeKind::ReturnStatement
        | NodeKind::ExpressionStatement
        | NodeKind::VariableDeclarator { .. }
        | NodeKind::Literal(_)
        | NodeKind::Sequence
        | NodeKind::Call
        | NodeKind::Other => None,
    }
}
