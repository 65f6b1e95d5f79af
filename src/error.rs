//! Failure reasons for outbound calls and transport operations

use async_openai::error::OpenAIError;
use thiserror::Error;

/// Why an outbound HTTP call produced no usable value.
///
/// Callers in the pipeline map every variant to a fallback; the variant only
/// matters for logging and tests.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("response is missing {0}")]
    Missing(&'static str),

    #[error("api error: {0}")]
    Api(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_body() || err.is_decode() {
            Self::Body(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<OpenAIError> for FetchError {
    fn from(err: OpenAIError) -> Self {
        match err {
            OpenAIError::Reqwest(e) => e.into(),
            OpenAIError::ApiError(e) => Self::Api(e.message),
            OpenAIError::JSONDeserialize(e) => Self::Body(e.to_string()),
            other => Self::Api(other.to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("delete failed: {0}")]
    Delete(String),

    #[error("send failed: {0}")]
    Send(String),

    #[error("invalid media url: {0}")]
    InvalidMedia(String),
}
