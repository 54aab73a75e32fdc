//! Domain-specific error types.
//!
//! Uses `thiserror` for structured error definitions rather than relying
//! solely on `anyhow` for everything.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Errors from the source parser. Always fatal for a run.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("syntax error: {message} ({diagnostics} diagnostics)")]
    Syntax { message: String, diagnostics: usize },

    #[error("parser gave up on the script ({0} diagnostics)")]
    Panicked(usize),

    #[error("empty script")]
    EmptyScript,

    #[error("expressions nested deeper than {limit} levels")]
    TooDeep { limit: usize },

    #[error("parser thread failed: {0}")]
    Worker(String),
}

/// Errors local to a single key-table slot.
///
/// None of these abort a run: the slot is marked invalid and the remaining
/// slots are still extracted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotError {
    #[error("shape not found: {0}")]
    ShapeNotFound(String),

    #[error("unresolved variable `{0}`")]
    UnresolvedVariable(String),

    #[error("cannot evaluate expression: {0}")]
    Evaluation(String),
}

impl Serialize for SlotError {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

/// Errors from the script-retrieval collaborator.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Number of 32-bit words in one round group.
pub const WORDS_PER_GROUP: usize = 4;
/// Number of main rounds housed in the big-switch body.
pub const MAIN_ROUNDS: usize = 13;
/// Total number of round groups in a complete key table.
pub const TABLE_GROUPS: usize = MAIN_ROUNDS + 2;
