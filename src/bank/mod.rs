//! Per-word model bank: train every word, then recognize held-out utterances.

pub mod recognize;
pub mod train;

pub use recognize::*;
pub use train::*;
