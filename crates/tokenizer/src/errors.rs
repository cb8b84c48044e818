use thiserror::Error;

use crate::config::ModelFamily;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("tokenizer error: {0}")]
    Tokenizer(#[from] tokenizers::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("model family {0} does not support sentence pairs")]
    UnsupportedPair(ModelFamily),

    #[error("token '{0}' is not in the tokenizer vocabulary")]
    UnknownToken(String),

    #[error("validation failed: {0}")]
    Validation(String),
}
