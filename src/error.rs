//! Error types for quality control evaluation.
//!
//! Every engine in this crate is total over well-formed input. The conditions
//! below are the only ones reported, and they are reported as values so the
//! caller can show a targeted message instead of a NaN on a chart.

use serde::Serialize;
use thiserror::Error;

/// Quality control evaluation errors.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum QcError {
    /// A statistic was requested over an empty series.
    #[error("Missing data: {what} requires at least one observation")]
    MissingData { what: &'static str },

    /// A scalar parameter is outside its supported domain.
    #[error("Invalid parameter: {name} - {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Bias meets or exceeds the allowable total error, so the
    /// conventional sigma-metric has no meaningful value.
    #[error("Degenerate metric: bias {bias} is not below TEa {tea}")]
    DegenerateMetric { bias: f64, tea: f64 },

    /// A series value is NaN or infinite.
    #[error("Invalid data: value {value} at index {index} is not a finite number")]
    InvalidData { index: usize, value: f64 },

    /// Configuration could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl QcError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Result type for quality control operations.
pub type Result<T> = std::result::Result<T, QcError>;
