use std::path::PathBuf;

use attention::AttentionError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ViewError>;

#[derive(Error, Debug)]
pub enum ViewError {
    #[error(transparent)]
    Attention(#[from] AttentionError),

    #[error(transparent)]
    Tokenizer(#[from] tokenizer::Error),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to load tensors from {}: {source}", path.display())]
    Tensors {
        path: PathBuf,
        source: candle_core::Error,
    },

    #[error("failed to parse {what}: {message}")]
    Format { what: String, message: String },

    #[error("invalid configuration: {}", .0.join("; "))]
    Validation(Vec<String>),
}

impl ViewError {
    pub fn validation(messages: Vec<String>) -> Self {
        Self::Validation(messages)
    }

    pub(crate) fn format(what: impl Into<String>, message: impl ToString) -> Self {
        Self::Format {
            what: what.into(),
            message: message.to_string(),
        }
    }
}
