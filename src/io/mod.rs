//! Input/output helpers.
//!
//! - CSV corpus ingest + validation (`ingest`)
//! - bank JSON and candidate-score CSV exports (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
