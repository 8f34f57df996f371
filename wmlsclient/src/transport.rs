//! HTTP delivery of SOAP envelopes
//!
//! One blocking POST per call, on a fresh connection. The transport owns the
//! SOAP framing headers (`Content-Type`, `SOAPAction`) and authentication.

use crate::error::{Result, WmlsError};
use base64::Engine;
use std::fmt;
use std::io::ErrorKind;
use std::time::Duration;
use tracing::{debug, warn};
use ureq::Agent;
use ureq::tls::TlsConfig;
use wmlsoap::SoapVersion;

/// Headers a caller may not override.
const RESERVED_HEADERS: &[&str] = &["content-type", "soapaction", "authorization"];

/// One SOAP exchange handed to a [`Transport`].
#[derive(Debug, Clone, Copy)]
pub struct SoapCall<'a> {
    pub envelope: &'a str,
    /// SOAP action URI of the operation
    pub action: &'a str,
    /// Extra HTTP headers supplied by the caller
    pub headers: &'a [(&'a str, &'a str)],
    /// Read timeout: how long to wait for the response headers
    pub timeout: Duration,
    /// Limit on downloading the whole body; `None` waits as long as data arrives
    pub body_timeout: Option<Duration>,
}

/// Sends an envelope and returns the raw response body.
///
/// Implementations classify the HTTP outcome: 2xx and 3xx return the body,
/// anything else is a [`WmlsError::Transport`].
pub trait Transport: Send + Sync + fmt::Debug {
    fn send(&self, call: &SoapCall<'_>) -> Result<String>;
}

/// [`Transport`] over HTTP(S), built on `ureq`.
#[derive(Clone)]
pub struct HttpTransport {
    url: String,
    username: String,
    password: String,
    soap_version: SoapVersion,
    accept_invalid_certs: bool,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"***")
            .field("soap_version", &self.soap_version)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

impl HttpTransport {
    pub fn new(url: impl Into<String>, soap_version: SoapVersion) -> Self {
        Self {
            url: url.into(),
            username: String::new(),
            password: String::new(),
            soap_version,
            accept_invalid_certs: false,
        }
    }

    /// HTTP Basic credentials, sent only when `username` is not empty
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Skips server certificate verification.
    ///
    /// Some field stores run with self-signed certificates. Off by default.
    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn soap_version(&self) -> SoapVersion {
        self.soap_version
    }

    pub fn accept_invalid_certs(&self) -> bool {
        self.accept_invalid_certs
    }

    fn tls_config(&self) -> TlsConfig {
        TlsConfig::builder()
            .disable_verification(self.accept_invalid_certs)
            .build()
    }

    fn agent(&self, timeout: Duration, body_timeout: Option<Duration>) -> Agent {
        if self.accept_invalid_certs && self.url.starts_with("https") {
            warn!(url = %self.url, "TLS certificate verification is disabled");
        }

        Agent::config_builder()
            .http_status_as_error(false)
            .max_redirects(0)
            .timeout_recv_response(Some(timeout))
            .timeout_recv_body(body_timeout)
            .tls_config(self.tls_config())
            .build()
            .into()
    }

    fn authorization(&self) -> Option<String> {
        if self.username.is_empty() {
            return None;
        }
        let token = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", self.username, self.password));
        Some(format!("Basic {}", token))
    }
}

impl Transport for HttpTransport {
    fn send(&self, call: &SoapCall<'_>) -> Result<String> {
        let agent = self.agent(call.timeout, call.body_timeout);
        let mut request = agent.post(self.url.as_str());

        for (name, value) in call.headers {
            if RESERVED_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
                debug!(header = %name, "Ignoring caller header owned by the transport");
                continue;
            }
            request = request.header(*name, *value);
        }

        request = request.header("Content-Type", self.soap_version.content_type(call.action));
        if let Some(action) = self.soap_version.soap_action_header(call.action) {
            request = request.header("SOAPAction", action);
        }
        if let Some(auth) = self.authorization() {
            request = request.header("Authorization", auth);
        }

        debug!(
            url = %self.url,
            action = %call.action,
            bytes = call.envelope.len(),
            soap_version = %self.soap_version,
            "Sending WMLS request"
        );

        let mut response = request
            .send(call.envelope)
            .map_err(|e| classify(e, call.timeout))?;

        let status = response.status();
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_string()
            .map_err(|e| classify(e, call.body_timeout.unwrap_or(call.timeout)))?;

        debug!(status = status.as_u16(), bytes = body.len(), "Received WMLS response");

        if status.is_success() || status.is_redirection() {
            Ok(body)
        } else {
            warn!(status = status.as_u16(), url = %self.url, "WMLS request failed");
            Err(WmlsError::http_status(status.as_u16(), body))
        }
    }
}

fn classify(err: ureq::Error, timeout: Duration) -> WmlsError {
    match err {
        ureq::Error::Timeout(_) => WmlsError::Timeout(timeout),
        ureq::Error::Io(ref io) if matches!(io.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
            WmlsError::Timeout(timeout)
        }
        other => WmlsError::connection(other.to_string()),
    }
}
