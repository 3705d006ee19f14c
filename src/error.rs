//! Error types for the dupligraph library.
//!
//! Every fallible operation in this crate returns [`Result`]. Failures that
//! spec'd graceful degradation (degenerate fragments, LSH fallback,
//! cancellation) are handled internally and never surface as an `Err` —
//! this taxonomy exists for construction-time validation and truly
//! unrecoverable internal invariant breaks.

use thiserror::Error;

/// Result type for dupligraph operations.
pub type Result<T> = std::result::Result<T, DupligraphError>;

/// Errors produced by the clone-detection core.
#[derive(Error, Debug)]
pub enum DupligraphError {
    /// Configuration rejected at construction time.
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable description.
        message: String,
        /// Offending field, if any.
        field: Option<String>,
    },

    /// A value failed validation (out of range, inconsistent ordering, …).
    #[error("validation error: {message}")]
    Validation {
        /// Human-readable description.
        message: String,
        /// Offending field, if any.
        field: Option<String>,
    },

    /// LSH index construction or lookup failure.
    #[error("LSH error: {message}")]
    Lsh {
        /// Human-readable description.
        message: String,
    },

    /// APTED computation failure (should only occur on malformed trees).
    #[error("APTED error: {message}")]
    Apted {
        /// Human-readable description.
        message: String,
    },

    /// Pipeline stage failure.
    #[error("pipeline error at stage '{stage}': {message}")]
    Pipeline {
        /// Pipeline stage name.
        stage: String,
        /// Human-readable description.
        message: String,
    },

    /// Internal invariant violation.
    #[error("internal error: {message}")]
    Internal {
        /// Human-readable description.
        message: String,
    },
}

impl DupligraphError {
    /// Construct a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: None,
        }
    }

    /// Construct a configuration error with an offending field name.
    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Construct a validation error with an offending field name.
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Construct an LSH error.
    pub fn lsh(message: impl Into<String>) -> Self {
        Self::Lsh {
            message: message.into(),
        }
    }

    /// Construct an APTED error.
    pub fn apted(message: impl Into<String>) -> Self {
        Self::Apted {
            message: message.into(),
        }
    }

    /// Construct a pipeline error.
    pub fn pipeline(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Pipeline {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Construct an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
