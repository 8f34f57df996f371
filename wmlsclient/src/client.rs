//! WITSML Store client
//!
//! # Example
//!
//! ```no_run
//! use wmlsclient::WmlsClient;
//!
//! let client = WmlsClient::new("https://witsml.example.com/store", "driller", "s3cret")?;
//!
//! let query = r#"<wells xmlns="http://www.witsml.org/schemas/131" version="1.3.1.1">
//!   <well uid=""><name/></well>
//! </wells>"#;
//! let response = client.get_from_store(query, Some("returnElements=id-only"), &[])?;
//! if response.is_success() {
//!     println!("{}", response.xml_out);
//! } else {
//!     eprintln!("store error {}: {}", response.result, response.supp_msg);
//! }
//! # Ok::<(), wmlsclient::WmlsError>(())
//! ```

use crate::error::{Result, WmlsError};
use crate::transport::{HttpTransport, SoapCall, Transport};
use std::time::Duration;
use tracing::debug;
use url::Url;
use wmlsoap::{
    EnvelopeDefaults, SoapVersion, StoreOperation, StoreRequest, StoreResponse, build_envelope,
    extract_response,
};

/// Default read timeout (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Blocking client for a WITSML store
///
/// The client holds immutable settings only (the read timeout can be
/// changed between calls), so one instance can serve many threads: every
/// call builds its own envelope and opens its own connection.
#[derive(Debug)]
pub struct WmlsClient {
    url: String,
    defaults: EnvelopeDefaults,
    timeout: Duration,
    body_timeout: Option<Duration>,
    transport: Box<dyn Transport>,
}

impl WmlsClient {
    /// Create a client with default settings
    ///
    /// An empty `username` disables HTTP Basic authentication.
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        Self::builder(url).credentials(username, password).build()
    }

    /// Create a builder for configuring the client
    pub fn builder(url: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(url)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Change the read timeout used by subsequent calls
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Limit on the whole body download, `None` when unbounded
    pub fn body_timeout(&self) -> Option<Duration> {
        self.body_timeout
    }

    pub fn options_in(&self) -> &str {
        &self.defaults.options_in
    }

    pub fn capabilities_in(&self) -> &str {
        &self.defaults.capabilities_in
    }

    // ========================================================================
    // Store operations
    // ========================================================================

    /// WMLS_AddToStore: add the objects described by `template`
    pub fn add_to_store(
        &self,
        template: &str,
        options_in: Option<&str>,
        headers: &[(&str, &str)],
    ) -> Result<StoreResponse> {
        self.store_call(StoreOperation::AddToStore, template, options_in, headers)
    }

    /// WMLS_DeleteFromStore: delete the objects selected by `template`
    pub fn delete_from_store(
        &self,
        template: &str,
        options_in: Option<&str>,
        headers: &[(&str, &str)],
    ) -> Result<StoreResponse> {
        self.store_call(StoreOperation::DeleteFromStore, template, options_in, headers)
    }

    /// WMLS_UpdateInStore: update the objects described by `template`
    pub fn update_in_store(
        &self,
        template: &str,
        options_in: Option<&str>,
        headers: &[(&str, &str)],
    ) -> Result<StoreResponse> {
        self.store_call(StoreOperation::UpdateInStore, template, options_in, headers)
    }

    /// WMLS_GetFromStore: query the store with `template`
    pub fn get_from_store(
        &self,
        template: &str,
        options_in: Option<&str>,
        headers: &[(&str, &str)],
    ) -> Result<StoreResponse> {
        self.store_call(StoreOperation::GetFromStore, template, options_in, headers)
    }

    /// WMLS_GetCap: fetch the server capabilities (`CapabilitiesOut`)
    pub fn get_cap(
        &self,
        options_in: Option<&str>,
        headers: &[(&str, &str)],
    ) -> Result<StoreResponse> {
        let request = StoreRequest::get_cap().with_options_in(options_in);
        self.call(&request, headers)
    }

    fn store_call(
        &self,
        operation: StoreOperation,
        template: &str,
        options_in: Option<&str>,
        headers: &[(&str, &str)],
    ) -> Result<StoreResponse> {
        let request = StoreRequest::new(operation, Some(template))?.with_options_in(options_in);
        self.call(&request, headers)
    }

    /// Run a prepared request: envelope, transport, response extraction
    ///
    /// Exactly one attempt is made; nothing is retried.
    pub fn call(&self, request: &StoreRequest, headers: &[(&str, &str)]) -> Result<StoreResponse> {
        let envelope = build_envelope(request, &self.defaults);
        let action = request.operation.action_uri();

        debug!(
            operation = %request.operation,
            wml_type = request.wml_type.as_deref().unwrap_or("-"),
            "Calling WITSML store"
        );

        let body = self.transport.send(&SoapCall {
            envelope: &envelope,
            action: &action,
            headers,
            timeout: self.timeout,
            body_timeout: self.body_timeout,
        })?;

        let response = extract_response(&body)?;
        debug!(
            operation = %request.operation,
            result = response.result,
            "WITSML store answered"
        );
        Ok(response)
    }
}

/// Builder for [`WmlsClient`]
#[derive(Debug)]
pub struct ClientBuilder {
    url: String,
    username: String,
    password: String,
    timeout: Duration,
    body_timeout: Option<Duration>,
    options_in: String,
    capabilities_in: String,
    soap_version: SoapVersion,
    accept_invalid_certs: bool,
    transport: Option<Box<dyn Transport>>,
}

impl ClientBuilder {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: String::new(),
            password: String::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            body_timeout: None,
            options_in: String::new(),
            capabilities_in: String::new(),
            soap_version: SoapVersion::default(),
            accept_invalid_certs: false,
            transport: None,
        }
    }

    /// Replace the endpoint URL
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set HTTP Basic credentials
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Set the read timeout (time allowed for the store to start answering)
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Limit the time spent downloading a response body
    ///
    /// Unbounded by default: a large log keeps streaming as long as the
    /// store keeps sending.
    pub fn body_timeout(mut self, body_timeout: Option<Duration>) -> Self {
        self.body_timeout = body_timeout;
        self
    }

    /// Default `OptionsIn`, used when a call does not pass its own
    pub fn options_in(mut self, options_in: impl Into<String>) -> Self {
        self.options_in = options_in.into();
        self
    }

    /// `CapabilitiesIn` sent with every add/delete/update/get call
    pub fn capabilities_in(mut self, capabilities_in: impl Into<String>) -> Self {
        self.capabilities_in = capabilities_in.into();
        self
    }

    pub fn soap_version(mut self, soap_version: SoapVersion) -> Self {
        self.soap_version = soap_version;
        self
    }

    /// Accept any server certificate. Off by default.
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Use a custom transport instead of HTTP
    ///
    /// Credentials, SOAP version and certificate settings only apply to the
    /// built-in HTTP transport.
    pub fn transport(mut self, transport: Box<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// HTTP transport matching the builder settings
    pub fn http_transport(&self) -> HttpTransport {
        HttpTransport::new(self.url.clone(), self.soap_version)
            .with_credentials(self.username.clone(), self.password.clone())
            .with_accept_invalid_certs(self.accept_invalid_certs)
    }

    /// Build the client
    ///
    /// Fails with [`WmlsError::InvalidUrl`] unless the endpoint is an
    /// `http` or `https` URL.
    pub fn build(mut self) -> Result<WmlsClient> {
        let parsed = Url::parse(&self.url)
            .map_err(|e| WmlsError::InvalidUrl(format!("{}: {}", self.url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(WmlsError::InvalidUrl(format!(
                "{}: unsupported scheme '{}'",
                self.url,
                parsed.scheme()
            )));
        }

        let transport: Box<dyn Transport> = match self.transport.take() {
            Some(transport) => transport,
            None => Box::new(self.http_transport()),
        };

        Ok(WmlsClient {
            url: self.url,
            defaults: EnvelopeDefaults {
                options_in: self.options_in,
                capabilities_in: self.capabilities_in,
            },
            timeout: self.timeout,
            body_timeout: self.body_timeout,
            transport,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    const OK_RESPONSE: &str = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body><WMLS_GetFromStoreResponse><Result>1</Result><XMLout>&lt;wells/&gt;</XMLout><SuppMsgOut/></WMLS_GetFromStoreResponse></soap:Body></soap:Envelope>"#;

    #[derive(Debug, Clone, PartialEq)]
    struct Recorded {
        envelope: String,
        action: String,
        headers: Vec<(String, String)>,
        timeout: Duration,
        body_timeout: Option<Duration>,
    }

    /// Transport double that records calls and replays a canned body
    #[derive(Debug, Clone)]
    struct RecordingTransport {
        calls: Arc<Mutex<Vec<Recorded>>>,
        reply: String,
    }

    impl RecordingTransport {
        fn new(reply: &str) -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                reply: reply.to_string(),
            }
        }

        fn calls(&self) -> Vec<Recorded> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Transport for RecordingTransport {
        fn send(&self, call: &SoapCall<'_>) -> Result<String> {
            self.calls.lock().unwrap().push(Recorded {
                envelope: call.envelope.to_string(),
                action: call.action.to_string(),
                headers: call
                    .headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                timeout: call.timeout,
                body_timeout: call.body_timeout,
            });
            Ok(self.reply.clone())
        }
    }

    fn client_with(transport: &RecordingTransport) -> WmlsClient {
        WmlsClient::builder("http://localhost:8080/witsml/store")
            .options_in("returnElements=requested")
            .transport(Box::new(transport.clone()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_get_from_store_goes_through_transport() {
        let transport = RecordingTransport::new(OK_RESPONSE);
        let client = client_with(&transport);

        let response = client
            .get_from_store("<wells><well uid=\"\"/></wells>", None, &[("X-Trace", "1")])
            .unwrap();
        assert_eq!(response.result, 1);
        assert_eq!(response.xml_out, "<wells/>");

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].action,
            "http://www.witsml.org/action/120/Store.WMLS_GetFromStore"
        );
        assert!(calls[0].envelope.contains("<WMLtypeIn>well</WMLtypeIn>"));
        assert!(calls[0].envelope.contains("<OptionsIn>returnElements=requested</OptionsIn>"));
        assert_eq!(calls[0].headers, vec![("X-Trace".to_string(), "1".to_string())]);
        assert_eq!(calls[0].timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(calls[0].body_timeout, None);
    }

    #[test]
    fn test_body_timeout_is_passed_to_transport() {
        let transport = RecordingTransport::new(OK_RESPONSE);
        let client = WmlsClient::builder("http://localhost:8080/witsml/store")
            .timeout(Duration::from_secs(10))
            .body_timeout(Some(Duration::from_secs(600)))
            .transport(Box::new(transport.clone()))
            .build()
            .unwrap();
        client.get_cap(None, &[]).unwrap();

        let calls = transport.calls();
        assert_eq!(calls[0].timeout, Duration::from_secs(10));
        assert_eq!(calls[0].body_timeout, Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_builder_transport_keeps_certificate_policy() {
        let builder = WmlsClient::builder("https://witsml.example.com/store");
        assert!(!builder.http_transport().accept_invalid_certs());

        let builder = builder.accept_invalid_certs(true);
        assert!(builder.http_transport().accept_invalid_certs());
    }

    #[test]
    fn test_each_operation_uses_its_action() {
        let transport = RecordingTransport::new(OK_RESPONSE);
        let client = client_with(&transport);
        let template = "<logs><log/></logs>";

        client.add_to_store(template, None, &[]).unwrap();
        client.delete_from_store(template, None, &[]).unwrap();
        client.update_in_store(template, None, &[]).unwrap();
        client.get_from_store(template, None, &[]).unwrap();
        client.get_cap(None, &[]).unwrap();

        let actions: Vec<String> = transport.calls().into_iter().map(|c| c.action).collect();
        let expected: Vec<String> = StoreOperation::ALL.iter().map(|op| op.action_uri()).collect();
        assert_eq!(actions, expected);
    }

    #[test]
    fn test_malformed_payload_never_reaches_transport() {
        let transport = RecordingTransport::new(OK_RESPONSE);
        let client = client_with(&transport);

        let err = client.add_to_store("not <xml", None, &[]).unwrap_err();
        assert!(matches!(err, WmlsError::MalformedPayload(_)));
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn test_malformed_response() {
        let transport = RecordingTransport::new("<html>oops");
        let client = client_with(&transport);
        let err = client.get_cap(None, &[]).unwrap_err();
        assert!(matches!(err, WmlsError::MalformedResponse(_)));
    }

    #[test]
    fn test_set_timeout_applies_to_next_call() {
        let transport = RecordingTransport::new(OK_RESPONSE);
        let mut client = client_with(&transport);
        client.set_timeout(Duration::from_secs(5));
        client.get_cap(Some("dataVersion=1.3.1.1"), &[]).unwrap();

        let calls = transport.calls();
        assert_eq!(calls[0].timeout, Duration::from_secs(5));
        assert!(calls[0].envelope.contains("<OptionsIn>dataVersion=1.3.1.1</OptionsIn>"));
    }

    #[test]
    fn test_invalid_urls() {
        assert!(matches!(
            WmlsClient::new("not a url", "", "").unwrap_err(),
            WmlsError::InvalidUrl(_)
        ));
        assert!(matches!(
            WmlsClient::new("ftp://witsml.example.com/store", "", "").unwrap_err(),
            WmlsError::InvalidUrl(_)
        ));
    }

    #[test]
    fn test_client_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<WmlsClient>();
    }
}
