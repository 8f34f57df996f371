//! Construction des enveloppes de requête WMLS
//!
//! Envelopes are produced by a pure function of the request and the
//! client-wide defaults: identical inputs always give byte-identical output.

use super::payload::{escape_xml, extract_type};
use super::{SoapError, StoreOperation};

/// SOAP 1.1 envelope namespace.
pub const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// SOAP encoding style announced on every operation element.
pub const SOAP_ENCODING_NS: &str = "http://schemas.xmlsoap.org/soap/encoding/";

/// WITSML 1.2.0 message namespace.
pub const WITSML_MESSAGE_NS: &str = "http://www.witsml.org/message/120";

const ENVELOPE_BEGIN: &str = r#"<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/"
    xmlns:ns0="http://www.witsml.org/message/120">
    <SOAP-ENV:Header/>
    <SOAP-ENV:Body>
"#;

const ENVELOPE_END: &str = r#"    </SOAP-ENV:Body>
</SOAP-ENV:Envelope>
"#;

/// Client-wide values used when a request does not override them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvelopeDefaults {
    pub options_in: String,
    pub capabilities_in: String,
}

/// One call to the store, before it is wrapped in an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreRequest {
    pub operation: StoreOperation,
    /// Object type derived from the template root; `None` for `GetCap`.
    pub wml_type: Option<String>,
    /// Raw (unescaped) template; `None` for `GetCap`.
    pub payload: Option<String>,
    /// Per-call `OptionsIn`, replacing the client default.
    pub options_in: Option<String>,
}

impl StoreRequest {
    /// Prepares a request, deriving the object type from the template.
    ///
    /// `GetCap` takes no template: any payload given is dropped and no
    /// parsing happens. Every other operation needs a well-formed template.
    pub fn new(operation: StoreOperation, payload: Option<&str>) -> Result<Self, SoapError> {
        if !operation.requires_payload() {
            return Ok(Self::get_cap());
        }

        let payload = payload.ok_or_else(|| {
            SoapError::malformed_payload(format!("{} requires a template", operation))
        })?;
        let wml_type = extract_type(payload)?;

        Ok(Self {
            operation,
            wml_type: Some(wml_type),
            payload: Some(payload.to_string()),
            options_in: None,
        })
    }

    pub fn get_cap() -> Self {
        Self {
            operation: StoreOperation::GetCap,
            wml_type: None,
            payload: None,
            options_in: None,
        }
    }

    pub fn with_options_in(mut self, options_in: Option<&str>) -> Self {
        self.options_in = options_in.map(str::to_string);
        self
    }
}

/// Wraps a request in the WITSML SOAP envelope.
pub fn build_envelope(request: &StoreRequest, defaults: &EnvelopeDefaults) -> String {
    let element = request.operation.body_element();
    let options_in = request
        .options_in
        .as_deref()
        .unwrap_or(&defaults.options_in);

    let mut out = String::with_capacity(
        ENVELOPE_BEGIN.len()
            + ENVELOPE_END.len()
            + request.payload.as_ref().map_or(0, |p| p.len() * 2)
            + 512,
    );
    out.push_str(ENVELOPE_BEGIN);

    out.push_str(&format!(
        "        <ns0:{} SOAP-ENV:encodingStyle=\"{}\">\n",
        element, SOAP_ENCODING_NS
    ));

    if let Some(payload_field) = request.operation.payload_field() {
        let wml_type = request.wml_type.as_deref().unwrap_or_default();
        let payload = request.payload.as_deref().unwrap_or_default();
        push_field(&mut out, "WMLtypeIn", wml_type);
        push_field(&mut out, payload_field, &escape_xml(payload));
        push_field(&mut out, "OptionsIn", &escape_xml(options_in));
        push_field(&mut out, "CapabilitiesIn", &escape_xml(&defaults.capabilities_in));
    } else {
        push_field(&mut out, "OptionsIn", &escape_xml(options_in));
    }

    out.push_str(&format!("        </ns0:{}>\n", element));
    out.push_str(ENVELOPE_END);
    out
}

fn push_field(out: &mut String, name: &str, value: &str) {
    out.push_str(&format!("            <{name}>{value}</{name}>\n"));
}
