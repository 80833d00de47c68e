//! Data sources: the in-memory corpus and synthetic corpus generation.

pub mod corpus;
pub mod sample;

pub use corpus::*;
pub use sample::*;
