//! Roundkey: static round-key recovery from obfuscated scripts
//!
//! Parses an obfuscated script without running it, finds the statements that
//! compute the first, main and last rounds of its key schedule, resolves the
//! literals those statements reference and evaluates them into 32-bit words.
//! A prefix of the resulting table is packed into a raw byte key.

pub mod core;
pub mod utils;

pub mod errors;
pub mod expr;
pub mod extractor;
pub mod key;
pub mod matcher;
pub mod parser;
pub mod resolver;
pub mod rounds;
pub mod syntax;
