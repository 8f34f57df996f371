//! Préparation du template WITSML envoyé au store

use super::SoapError;
use std::io::BufReader;
use xmltree::Element;

/// Derives the WITSML object type from a template.
///
/// WITSML container roots are the plural of the object they hold
/// (`<logs>` holds `<log>`), so the type is the root's local name minus its
/// last character. No dictionary is consulted: a root that does not follow
/// the convention yields a wrong type rather than an error.
pub fn extract_type(xml: &str) -> Result<String, SoapError> {
    let root = Element::parse(BufReader::new(xml.as_bytes()))
        .map_err(|e| SoapError::malformed_payload(e.to_string()))?;

    let mut name = root.name;
    name.pop();
    Ok(name)
}

/// Escapes `&` and `<` so the template can travel as character data.
///
/// `>` is left alone; WITSML stores accept it unescaped.
pub fn escape_xml(xml: &str) -> String {
    xml.replace('&', "&amp;").replace('<', "&lt;")
}
