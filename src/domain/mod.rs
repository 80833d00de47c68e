//! Domain types used throughout the selection pipeline.
//!
//! This module defines:
//!
//! - the per-word data indices (`WordSequenceIndex`, `WordFlatIndex`, `FlatSequences`)
//! - selector configuration (`SelectorConfig`, `SelectorKind`)
//! - the trainer request shape (`CovarianceKind`)

pub mod types;

pub use types::*;
