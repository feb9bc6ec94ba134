use thiserror::Error;

/// Failures surfaced by the API client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request did not complete within its timeout and was aborted
    #[error("request_timeout")]
    RequestTimeout,

    /// A 2xx response whose body is not JSON
    #[error("invalid_content_type")]
    InvalidContentType,

    #[error("invalid_json")]
    InvalidJson,

    /// Non-2xx response; never retried except through the 401 recovery path
    #[error("API {method} {path} failed: {status} {status_text} {body}")]
    Status {
        method: String,
        path: String,
        status: u16,
        status_text: String,
        body: String,
    },

    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Raised locally, before any request is sent
    #[error("{operation} requires a valid id for {resource}")]
    MissingId {
        operation: &'static str,
        resource: String,
    },

    /// Session provider refused or failed an auth operation
    #[error("auth error: {0}")]
    Auth(String),

    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Only transport-level failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::RequestTimeout | ClientError::Network(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::RequestTimeout
        } else {
            ClientError::Network(err)
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
