//! Symbolic round-key expressions.
//!
//! An extractor turns each key-bearing operand it recognises into one of these.
//! They still reference the obfuscator's variable names; the resolver supplies
//! literal values for those names and the evaluator turns the substituted text
//! into a 32-bit word.

use crate::core::arithmetic;
use crate::errors::SlotError;
use crate::resolver::Bindings;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A symbolic round-key expression. Position in the extractor's output list
/// is significant: it decides the table slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoundKeyExpression {
    /// A verbatim source excerpt, e.g. `"-qX + 17"` or `"Vb"`.
    Source { text: String },
    /// An identifier with an optional prefix operator, e.g. `-` + `qX`.
    Signed {
        operator: Option<String>,
        name: String,
    },
}

impl RoundKeyExpression {
    // -- Convenience constructors ------------------------------------------

    /// Verbatim source excerpt.
    pub fn source(text: &str) -> Self {
        RoundKeyExpression::Source {
            text: text.to_string(),
        }
    }

    /// Identifier with a prefix operator.
    pub fn signed(operator: &str, name: &str) -> Self {
        RoundKeyExpression::Signed {
            operator: Some(operator.to_string()),
            name: name.to_string(),
        }
    }

    /// Bare identifier.
    pub fn name(name: &str) -> Self {
        RoundKeyExpression::Signed {
            operator: None,
            name: name.to_string(),
        }
    }

    // -- Queries -----------------------------------------------------------

    /// The expression as evaluable text.
    pub fn text(&self) -> String {
        self.to_string()
    }

    /// Variable names this expression needs bound before it can be evaluated.
    pub fn variable_names(&self) -> Vec<String> {
        match self {
            RoundKeyExpression::Signed { name, .. } => vec![name.clone()],
            RoundKeyExpression::Source { text } => arithmetic::identifiers(text),
        }
    }

    /// Substitute bound names and evaluate to a 32-bit word.
    pub fn evaluate(&self, bindings: &Bindings) -> Result<i32, SlotError> {
        let text = self.text();
        let substituted = arithmetic::substitute(&text, |name| bindings.get(name));
        log::trace!("evaluating `{text}` as `{substituted}`");
        arithmetic::evaluate(&substituted)
    }
}

impl fmt::Display for RoundKeyExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundKeyExpression::Source { text } => write!(f, "{text}"),
            RoundKeyExpression::Signed { operator, name } => {
                write!(f, "{}{name}", operator.as_deref().unwrap_or(""))
            }
        }
    }
}
