//! Classifier error types

use thiserror::Error;

/// Why a classification request produced nothing
#[derive(Debug, Error)]
pub enum NluError {
    #[error("Classifier request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Classifier returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Malformed classifier response: {0}")]
    Malformed(String),
}

impl NluError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}
