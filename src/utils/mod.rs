pub mod fetch;
pub mod helpers;
