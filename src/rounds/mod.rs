//! Round-key extraction passes.
//!
//! Each pass walks the shared syntax tree once, applies the shape predicates
//! from [`crate::matcher`], and emits symbolic expressions in document order.

pub mod first_round;
pub mod last_round;
pub mod main_rounds;
pub mod message;

pub use first_round::extract_first_round;
pub use last_round::extract_last_round;
pub use main_rounds::extract_main_rounds;
pub use message::{locate_message, MessageDescriptor};
