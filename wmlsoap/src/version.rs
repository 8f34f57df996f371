//! SOAP framing conventions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the SOAP action travels with the request.
///
/// The envelope itself is the same for both: only the HTTP framing changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SoapVersion {
    /// `text/xml` body, action in a `SOAPAction` header.
    #[default]
    #[serde(rename = "1.1")]
    Soap11,
    /// `application/soap+xml` body, action as a content type parameter.
    #[serde(rename = "1.2")]
    Soap12,
}

impl SoapVersion {
    /// Value of the `Content-Type` header for the given action URI.
    pub fn content_type(&self, action: &str) -> String {
        match self {
            SoapVersion::Soap11 => r#"text/xml; charset="utf-8""#.to_string(),
            SoapVersion::Soap12 => {
                format!(r#"application/soap+xml; charset="utf-8"; action="{}""#, action)
            }
        }
    }

    /// Value of the `SOAPAction` header, when this version uses one.
    pub fn soap_action_header(&self, action: &str) -> Option<String> {
        match self {
            SoapVersion::Soap11 => Some(action.to_string()),
            SoapVersion::Soap12 => None,
        }
    }
}

impl fmt::Display for SoapVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SoapVersion::Soap11 => f.write_str("1.1"),
            SoapVersion::Soap12 => f.write_str("1.2"),
        }
    }
}

impl FromStr for SoapVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1.1" | "11" | "soap11" | "soap1.1" => Ok(SoapVersion::Soap11),
            "1.2" | "12" | "soap12" | "soap1.2" => Ok(SoapVersion::Soap12),
            other => Err(format!("unsupported SOAP version '{}'", other)),
        }
    }
}
