//! Error types emitted while validating, slicing and assembling attention views.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AttentionError>;

/// Tensor axis a shape check was performed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Second-to-last axis (query positions, or positions of query/key vectors).
    Query,
    /// Last axis (key positions).
    Key,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Query => f.write_str("query"),
            Axis::Key => f.write_str("key"),
        }
    }
}

/// Attention-view error category.
#[derive(Error, Debug)]
pub enum AttentionError {
    /// A position axis disagrees with the token sequence it is paired with.
    #[error(
        "{axis} axis has {observed} positions, while number of tokens is {expected} (tokens: {tokens:?})"
    )]
    ShapeMismatch {
        axis: Axis,
        observed: usize,
        expected: usize,
        tokens: String,
    },

    /// The requested combination of inputs is outside the supported contract.
    #[error("unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    /// Optional data was requested but not supplied by the caller.
    #[error("missing data: {0}")]
    MissingData(String),

    /// A backend-specific failure propagated to the caller.
    #[error("tensor backend error: {0}")]
    Backend(#[from] candle_core::Error),
}

impl AttentionError {
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedConfiguration(message.into())
    }

    pub fn missing(message: impl Into<String>) -> Self {
        Self::MissingData(message.into())
    }

    pub(crate) fn shape_mismatch(
        axis: Axis,
        observed: usize,
        expected: usize,
        tokens: &[String],
    ) -> Self {
        Self::ShapeMismatch {
            axis,
            observed,
            expected,
            tokens: tokens.join(" "),
        }
    }
}
