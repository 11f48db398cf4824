use thiserror::Error;

/// Error type for Cockpit API operations.
///
/// - `MissingConfig` / `EmptyValue` / `InvalidApiKey`: configuration problems
/// - `InvalidOption` / `MissingBody`: a request option or body failed validation
/// - `Encoding`: the request body could not be serialized
/// - `Transport`: network or context failure, passed through unchanged
/// - `NotFound`: HTTP 404
/// - `UnexpectedStatus`: any other non-200 status code
/// - `Decode`: the response body did not match the expected JSON shape
#[derive(Debug, Error)]
pub enum CockpitError {
    #[error("{field} is required. either set it as default or pass it as an option")]
    MissingConfig { field: &'static str },

    #[error("{field} must not be empty")]
    EmptyValue { field: &'static str },

    #[error("api key is not a valid header value")]
    InvalidApiKey,

    #[error("invalid {option}: {reason}")]
    InvalidOption {
        option: &'static str,
        reason: String,
    },

    #[error("body is required for {method} requests")]
    MissingBody { method: String },

    #[error("failed to encode body: {0}")]
    Encoding(#[source] serde_json::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("not found: {url}")]
    NotFound { url: String },

    #[error("unexpected status code {status} {status_text}: {body}")]
    UnexpectedStatus {
        status: u16,
        status_text: String,
        body: String,
    },

    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),
}

impl CockpitError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CockpitError::NotFound { .. })
    }

    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            CockpitError::NotFound { .. } => Some(404),
            CockpitError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn invalid(option: &'static str, reason: impl Into<String>) -> Self {
        CockpitError::InvalidOption {
            option,
            reason: reason.into(),
        }
    }
}

/// Failures raised by a [`Transport`](crate::transport::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("context canceled")]
    Canceled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Custom(Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, CockpitError>;
