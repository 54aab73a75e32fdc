//! Integer arithmetic shared by the evaluator.

pub mod arithmetic;
