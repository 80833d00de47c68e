//! Model fitting and state-count selection.
//!
//! Responsibilities:
//!
//! - the trainer seam (`Trainer` / `FittedModel`) and the default Baum–Welch trainer
//! - k-fold splits for cross-validation
//! - the four selection strategies and their shared helper

pub mod baum_welch;
pub mod folds;
pub mod selection;
pub mod strategies;
pub mod trainer;

#[cfg(test)]
pub(crate) mod testing;

pub use baum_welch::*;
pub use folds::*;
pub use selection::*;
pub use strategies::*;
pub use trainer::*;
