//! Error types for the WITSML store client

use std::time::Duration;
use wmlsoap::SoapError;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, WmlsError>;

/// Errors that can occur when calling a WITSML store
///
/// A `Result` code `<= 0` returned by the store is *not* an error here: it
/// comes back inside [`wmlsoap::StoreResponse`].
#[derive(Debug, thiserror::Error)]
pub enum WmlsError {
    /// The template is not XML, so no object type can be derived
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// The store answered with a body that is not XML
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// HTTP status outside 2xx/3xx, or a connection/TLS failure (`status` is `None`)
    #[error("Transport error: {message}")]
    Transport {
        status: Option<u16>,
        body: String,
        message: String,
    },

    /// The store did not answer within the read timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Endpoint is not an http(s) URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Configuration error (from wmlsconfig/anyhow)
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),
}

impl WmlsError {
    /// Error for an HTTP status the protocol treats as a failure
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::Transport {
            status: Some(status),
            body: body.into(),
            message: format!("HTTP status {}", status),
        }
    }

    /// Error for a failure below HTTP (connection refused, TLS, I/O...)
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            body: String::new(),
            message: message.into(),
        }
    }

    /// HTTP status carried by a transport error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            WmlsError::Transport { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, WmlsError::Timeout(_))
    }
}

impl From<SoapError> for WmlsError {
    fn from(err: SoapError) -> Self {
        match err {
            SoapError::MalformedPayload(msg) => WmlsError::MalformedPayload(msg),
            SoapError::MalformedResponse(msg) => WmlsError::MalformedResponse(msg),
        }
    }
}
