//! Fitted sequence models.
//!
//! The selectors only see models through the `FittedModel` trait; this module
//! holds the concrete Gaussian HMM produced by the default trainer.

pub mod hmm;

pub use hmm::*;
