//! Unified error hierarchy for pacecalc
//!
//! Engine functions never raise across the public surface: parsers return
//! `Result<_, ParseError>` and numeric routines return `Option`. The
//! top-level `PaceCalcError` covers the configuration and CLI boundary.

use thiserror::Error;

/// Top-level error type for pacecalc operations
#[derive(Debug, Error)]
pub enum PaceCalcError {
    /// Malformed distance, time or pace string
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Invalid argument supplied on the command line or in a script
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a duration, pace or distance string was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Nothing but whitespace
    #[error("empty value")]
    Empty,

    /// Wrong number of colon-separated segments for the grammar
    #[error("expected {expected} segments, found {found}")]
    SegmentCount { expected: String, found: usize },

    /// A segment that is not a plain non-negative integer
    #[error("segment '{segment}' is not a number")]
    NotANumber { segment: String },

    /// Minutes or seconds at or above 60, or tenths above 9
    #[error("{component} value {value} out of range")]
    OutOfRange { component: &'static str, value: u64 },

    /// Distance that is negative or not a decimal number
    #[error("invalid distance '{0}'")]
    InvalidDistance(String),
}

/// Result type alias for pacecalc operations
pub type Result<T> = std::result::Result<T, PaceCalcError>;

impl PaceCalcError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PaceCalcError::Parse(_) => ErrorSeverity::Warning,
            PaceCalcError::InvalidArgument(_) => ErrorSeverity::Warning,
            PaceCalcError::Configuration(_) => ErrorSeverity::Error,
            PaceCalcError::Io(_) => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            PaceCalcError::Parse(ParseError::Empty) => "A value is required".to_string(),
            PaceCalcError::Parse(err) => {
                format!("Could not read value ({}). Use M:SS or H:MM:SS.", err)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Error that prevents operation
    Error,
    /// Warning that doesn't prevent operation
    Warning,
}
