//! Reporting: formatted terminal output for selections, banks and recognition.

pub mod format;

pub use format::*;
