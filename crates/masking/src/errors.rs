//! Error types emitted by the masking engine.

use candle_core::DType;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MaskingError>;

#[derive(Debug, Error)]
pub enum MaskingError {
    /// The vocabulary cannot express the dominant `[MASK]` branch.
    #[error("tokenizer does not have a mask token, which is necessary for masked language modeling")]
    MissingMaskToken,

    #[error("tokenizer reports an empty vocabulary; random replacement needs at least one id")]
    EmptyVocabulary,

    #[error("shape mismatch for {context}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        context: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("{context} must be rank {expected}, got shape {actual:?}")]
    InvalidRank {
        context: &'static str,
        expected: &'static str,
        actual: Vec<usize>,
    },

    #[error("{context} expected an integer dtype but received {dtype:?}")]
    UnsupportedDType { context: &'static str, dtype: DType },

    #[error("token id {token_id} is not a valid vocabulary index")]
    InvalidTokenId { token_id: i64 },

    #[error("token id {token_id} has no importance weight (table covers {table_len} ids)")]
    UnalignedWeights { token_id: i64, table_len: usize },

    #[error("invalid configuration: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("failed to parse config: {0}")]
    ConfigFormat(String),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    #[error("tokenizer error: {0}")]
    Tokenizer(#[from] tokenizer::Error),
}

impl MaskingError {
    pub fn validation(messages: Vec<String>) -> Self {
        Self::Validation(messages)
    }

    /// The surrounding pipeline set up the tokenizer or engine incorrectly.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            MaskingError::MissingMaskToken
                | MaskingError::EmptyVocabulary
                | MaskingError::Validation(_)
                | MaskingError::ConfigFormat(_)
        )
    }

    /// Caller-supplied tensors do not line up with the batch.
    pub fn is_shape(&self) -> bool {
        matches!(
            self,
            MaskingError::ShapeMismatch { .. }
                | MaskingError::InvalidRank { .. }
                | MaskingError::UnsupportedDType { .. }
                | MaskingError::InvalidTokenId { .. }
                | MaskingError::UnalignedWeights { .. }
        )
    }
}

impl From<toml::de::Error> for MaskingError {
    fn from(value: toml::de::Error) -> Self {
        MaskingError::ConfigFormat(value.to_string())
    }
}

impl From<serde_json::Error> for MaskingError {
    fn from(value: serde_json::Error) -> Self {
        MaskingError::ConfigFormat(value.to_string())
    }
}
