//! Extraction des paramètres de sortie d'une réponse WMLS

use super::SoapError;
use quick_xml::events::{BytesText, Event};
use quick_xml::{Reader, Writer};
use serde::Serialize;
use std::io::BufReader;
use tracing::warn;
use xmltree::{Element, XMLNode};

/// The three out-parameters of a Store call.
///
/// `result` follows the WITSML convention: a value `<= 0` is a failure code,
/// a positive value means success (some operations return a count). It is
/// left to the caller to interpret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreResponse {
    pub result: i32,
    pub supp_msg: String,
    /// Returned document (`XMLout` or `CapabilitiesOut`), re-indented.
    pub xml_out: String,
}

impl StoreResponse {
    pub fn is_success(&self) -> bool {
        self.result > 0
    }
}

/// Parses a SOAP response body into a [`StoreResponse`].
///
/// Fields are looked up anywhere in the document by local name and the first
/// one in document order wins. Missing fields take their defaults (`0`,
/// empty strings). When the body holds a SOAP fault and no `SuppMsgOut`, the
/// fault reason becomes the message.
pub fn extract_response(xml: &str) -> Result<StoreResponse, SoapError> {
    let root = Element::parse(BufReader::new(xml.as_bytes()))
        .map_err(|e| SoapError::malformed_response(e.to_string()))?;

    let result = find_first(&root, "Result")
        .and_then(|e| e.get_text())
        .and_then(|t| t.trim().parse::<i32>().ok())
        .unwrap_or(0);

    let xml_out = find_first(&root, "XMLout")
        .or_else(|| find_first(&root, "CapabilitiesOut"))
        .map(|e| pretty_xml(&element_text(e)))
        .unwrap_or_default();

    let supp_msg = match find_first(&root, "SuppMsgOut") {
        Some(e) => element_text(e),
        None => find_first(&root, "Fault")
            .and_then(fault_reason)
            .unwrap_or_default(),
    };

    Ok(StoreResponse {
        result,
        supp_msg,
        xml_out,
    })
}

/// Re-indents an XML document with two spaces.
///
/// The declaration and whitespace-only text are dropped. Text that is not
/// well-formed XML comes back unchanged.
pub fn pretty_xml(xml: &str) -> String {
    if xml.trim().is_empty() {
        return String::new();
    }

    match reindent(xml) {
        Ok(pretty) => pretty,
        Err(e) => {
            warn!(error = %e, "Embedded document is not well-formed XML, keeping it as is");
            xml.to_string()
        }
    }
}

fn reindent(xml: &str) -> Result<String, String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    let mut open: Vec<String> = Vec::new();

    loop {
        let event = reader.read_event().map_err(|e| e.to_string())?;
        match event {
            Event::Eof => {
                // quick-xml stops quietly on a truncated document
                if let Some(name) = open.last() {
                    return Err(format!("unexpected end of document, <{}> is not closed", name));
                }
                break;
            }
            Event::Start(ref start) => {
                open.push(String::from_utf8_lossy(start.name().as_ref()).into_owned());
                writer.write_event(event).map_err(|e| e.to_string())?;
            }
            Event::End(_) => {
                open.pop();
                writer.write_event(event).map_err(|e| e.to_string())?;
            }
            Event::Decl(_) => {}
            Event::Text(t) if t.iter().all(u8::is_ascii_whitespace) => {}
            // Entity references stay inline with the surrounding text
            Event::GeneralRef(r) => {
                let escaped = format!("&{};", String::from_utf8_lossy(&r));
                writer
                    .write_event(Event::Text(BytesText::from_escaped(escaped)))
                    .map_err(|e| e.to_string())?;
            }
            event => writer.write_event(event).map_err(|e| e.to_string())?,
        }
    }

    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}

/// Depth-first, document-order search by local name.
fn find_first<'a>(element: &'a Element, name: &str) -> Option<&'a Element> {
    if element.name == name {
        return Some(element);
    }
    element.children.iter().find_map(|node| match node {
        XMLNode::Element(child) => find_first(child, name),
        _ => None,
    })
}

fn element_text(element: &Element) -> String {
    element
        .get_text()
        .map(|t| t.into_owned())
        .unwrap_or_default()
}

/// SOAP 1.1 `faultstring`, or SOAP 1.2 `Reason/Text`.
fn fault_reason(fault: &Element) -> Option<String> {
    find_first(fault, "faultstring")
        .or_else(|| find_first(fault, "Reason").and_then(|r| find_first(r, "Text")))
        .map(element_text)
        .map(|t| t.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>{}</soap:Body>
</soap:Envelope>"#,
            body
        )
    }

    #[test]
    fn test_extract_get_from_store_response() {
        let xml = wrap(
            r#"<ns1:WMLS_GetFromStoreResponse xmlns:ns1="http://www.witsml.org/message/120"><Result>1</Result><SuppMsgOut>ok</SuppMsgOut><XMLout>&lt;logs&gt;&lt;log/&gt;&lt;/logs&gt;</XMLout></ns1:WMLS_GetFromStoreResponse>"#,
        );
        let response = extract_response(&xml).unwrap();
        assert_eq!(
            response,
            StoreResponse {
                result: 1,
                supp_msg: "ok".to_string(),
                xml_out: "<logs>\n  <log/>\n</logs>".to_string(),
            }
        );
        assert!(response.is_success());
    }

    #[test]
    fn test_missing_result_defaults_to_zero() {
        let xml = wrap("<WMLS_AddToStoreResponse><SuppMsgOut>hmm</SuppMsgOut></WMLS_AddToStoreResponse>");
        let response = extract_response(&xml).unwrap();
        assert_eq!(response.result, 0);
        assert_eq!(response.supp_msg, "hmm");
        assert_eq!(response.xml_out, "");
        assert!(!response.is_success());
    }

    #[test]
    fn test_non_numeric_result_defaults_to_zero() {
        let xml = wrap("<R><Result>n/a</Result></R>");
        assert_eq!(extract_response(&xml).unwrap().result, 0);
    }

    #[test]
    fn test_negative_result_is_not_an_error() {
        let xml = wrap(
            "<WMLS_DeleteFromStoreResponse><Result> -433 </Result><SuppMsgOut>Object does not exist</SuppMsgOut></WMLS_DeleteFromStoreResponse>",
        );
        let response = extract_response(&xml).unwrap();
        assert_eq!(response.result, -433);
        assert_eq!(response.supp_msg, "Object does not exist");
    }

    #[test]
    fn test_capabilities_out() {
        let xml = wrap(
            r#"<WMLS_GetCapResponse><Result>1</Result><CapabilitiesOut>&lt;capServers version="1.3.1"&gt;&lt;capServer apiVers="1.3.1"&gt;&lt;name&gt;Store&lt;/name&gt;&lt;/capServer&gt;&lt;/capServers&gt;</CapabilitiesOut><SuppMsgOut/></WMLS_GetCapResponse>"#,
        );
        let response = extract_response(&xml).unwrap();
        assert_eq!(
            response.xml_out,
            "<capServers version=\"1.3.1\">\n  <capServer apiVers=\"1.3.1\">\n    <name>Store</name>\n  </capServer>\n</capServers>"
        );
        assert_eq!(response.supp_msg, "");
    }

    #[test]
    fn test_first_match_wins() {
        let xml = wrap("<A><Result>2</Result></A><B><Result>3</Result></B>");
        assert_eq!(extract_response(&xml).unwrap().result, 2);
    }

    #[test]
    fn test_malformed_response() {
        let err = extract_response("<html><body>Bad gateway").unwrap_err();
        assert!(matches!(err, SoapError::MalformedResponse(_)));
        assert!(extract_response("").is_err());
    }

    #[test]
    fn test_fault_reason_becomes_message() {
        let xml = wrap(
            "<soap:Fault><faultcode>soap:Server</faultcode><faultstring>Invalid credentials</faultstring></soap:Fault>",
        );
        let response = extract_response(&xml).unwrap();
        assert_eq!(response.result, 0);
        assert_eq!(response.supp_msg, "Invalid credentials");

        let soap12 = r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope"><env:Body><env:Fault><env:Code><env:Value>env:Receiver</env:Value></env:Code><env:Reason><env:Text xml:lang="en">Store offline</env:Text></env:Reason></env:Fault></env:Body></env:Envelope>"#;
        assert_eq!(extract_response(soap12).unwrap().supp_msg, "Store offline");
    }

    #[test]
    fn test_pretty_xml() {
        assert_eq!(
            pretty_xml(r#"<?xml version="1.0"?><wells><well uid="a"><name>A &amp; B</name></well></wells>"#),
            "<wells>\n  <well uid=\"a\">\n    <name>A &amp; B</name>\n  </well>\n</wells>"
        );
        assert_eq!(
            pretty_xml("<remark>Tom &amp; Jerry &lt;3</remark>"),
            "<remark>Tom &amp; Jerry &lt;3</remark>"
        );
        assert_eq!(pretty_xml("  "), "");
    }

    #[test]
    fn test_pretty_xml_keeps_broken_text() {
        assert_eq!(pretty_xml("<logs><log></logs>"), "<logs><log></logs>");
    }

    #[test]
    fn test_pretty_xml_keeps_truncated_text() {
        assert_eq!(pretty_xml("<logs><log>"), "<logs><log>");
        assert_eq!(
            pretty_xml("<logs><log uid=\"a\"><name>A</name></log>"),
            "<logs><log uid=\"a\"><name>A</name></log>"
        );
    }
}
