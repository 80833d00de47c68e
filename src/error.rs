use thiserror::Error;

/// Application-level error: a message plus the process exit code it maps to.
///
/// Exit codes:
/// - 2: bad input, configuration or I/O
/// - 3: insufficient data
/// - 4: internal / numerical failure
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// The trainer could not fit the requested state count on the given data.
///
/// Always recoverable: it means "this state count is infeasible here".
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrainError {
    #[error("insufficient data: {frames} frames for {n_components} states")]
    InsufficientData { frames: usize, n_components: usize },

    #[error("sequence lengths sum to {expected} but observations have {actual} rows")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("numerical failure: {0}")]
    NonFinite(String),

    #[error("trainer panicked: {0}")]
    Panicked(String),
}

/// A fitted model could not score an observation set.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    #[error("feature dimension mismatch: model has {expected}, data has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("sequence lengths sum to {expected} but observations have {actual} rows")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("no observations to score")]
    Empty,

    #[error("non-finite log-likelihood")]
    NonFinite,
}
