//! `state-select` library crate.
//!
//! The binary (`statesel`) is a thin wrapper around this library so that:
//!
//! - selection logic is testable without spawning processes
//! - the trainer seam can be filled by other HMM implementations

pub mod app;
pub mod bank;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
