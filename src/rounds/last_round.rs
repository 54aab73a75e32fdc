//! Last-round key words.
//!
//! The final round masks each output byte: `o = 255 & (k ^ s)`. Every fourth
//! masked xor, starting at the fourth, carries one of the last round's key
//! words as its left operand.

use crate::errors::{SlotError, WORDS_PER_GROUP};
use crate::expr::RoundKeyExpression;
use crate::matcher::{is_big_switch_body, masked_xor};
use crate::syntax::{NodeKind, SyntaxNode, SyntaxTree};

/// Index of the first sampled masked xor.
const FIRST_SAMPLE: usize = 3;
/// Distance between sampled masked xors.
const SAMPLE_STRIDE: usize = 4;

/// Extract the four last-round expressions.
///
/// Always returns exactly four slots; a slot whose sample is missing or has
/// an unrecognised shape holds [`SlotError::ShapeNotFound`].
///
/// Slots are positional. An unusable sample leaves a gap at its own index and
/// later words do not shift left to fill it. The legacy extractor compacted
/// them, so its output differs from this one whenever a sample is unusable.
pub fn extract_last_round(tree: &SyntaxTree) -> Vec<Result<RoundKeyExpression, SlotError>> {
    let candidates = masked_xor_operands(tree);
    log::debug!("last round: {} masked xor candidates", candidates.len());

    (0..WORDS_PER_GROUP)
        .map(|word| {
            let index = FIRST_SAMPLE + word * SAMPLE_STRIDE;
            let node = candidates.get(index).ok_or_else(|| {
                SlotError::ShapeNotFound(format!(
                    "last round word {word}: only {} masked xor steps",
                    candidates.len()
                ))
            })?;
            sampled_operand(tree, node).ok_or_else(|| {
                SlotError::ShapeNotFound(format!(
                    "last round word {word}: unsupported operand `{}`",
                    tree.text(node)
                ))
            })
        })
        .collect()
}

/// Left operands of every `o = m & (x ^ y)` assignment in the big-switch bodies.
fn masked_xor_operands(tree: &SyntaxTree) -> Vec<&SyntaxNode> {
    tree.nodes()
        .filter(|n| is_big_switch_body(n))
        .flat_map(|body| body.elements().iter().filter_map(masked_xor))
        .filter_map(SyntaxNode::left)
        .collect()
}

fn sampled_operand(tree: &SyntaxTree, node: &SyntaxNode) -> Option<RoundKeyExpression> {
    match &node.kind {
        NodeKind::Unary { operator } => {
            let argument = node.argument()?;
            match argument.left().and_then(SyntaxNode::name) {
                Some(name) => Some(RoundKeyExpression::signed(operator, name)),
                None => Some(RoundKeyExpression::source(&format!(
                    "{operator}{}",
                    tree.text(argument)
                ))),
            }
        }
        NodeKind::Identifier(name) => Some(RoundKeyExpression::name(name)),
        NodeKind::Binary { .. } => node
            .left()
            .and_then(SyntaxNode::name)
            .map(RoundKeyExpression::name),
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
