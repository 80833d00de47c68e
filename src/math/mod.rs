//! Numerical utilities: log-space arithmetic and k-means initialisation.

pub mod kmeans;
pub mod logspace;

pub use kmeans::*;
pub use logspace::*;
