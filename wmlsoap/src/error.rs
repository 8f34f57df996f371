//! Erreurs de la couche SOAP

/// Errors raised while building a request or reading a response.
#[derive(Debug, thiserror::Error)]
pub enum SoapError {
    /// The caller's template could not be parsed, so no object type can be derived.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// The store answered with something that is not an XML document.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl SoapError {
    pub fn malformed_payload(msg: impl Into<String>) -> Self {
        Self::MalformedPayload(msg.into())
    }

    pub fn malformed_response(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }
}
