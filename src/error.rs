//! Error types for the character embedder.
//!
//! Configuration problems are reported when the embedder is built, never at
//! forward time. Malformed batches are rejected at the call boundary.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmbedderError {
    /// The embedder cannot be built with the given settings.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A batch or parameter tensor has the wrong shape or out-of-range values.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl EmbedderError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub(crate) fn input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, EmbedderError>;
