//! # wmlsoap - SOAP layer of the WITSML Store API
//!
//! Ce crate construit les enveloppes SOAP des cinq opérations WMLS et
//! extrait les paramètres de sortie des réponses du store.
//!
//! ## Fonctionnalités
//!
//! - ✅ Dérivation du type d'objet WITSML depuis la racine du template
//! - ✅ Échappement du template (`&`, `<`)
//! - ✅ Enveloppes déterministes pour AddToStore, DeleteFromStore,
//!   UpdateInStore, GetFromStore et GetCap
//! - ✅ Extraction de `Result`, `SuppMsgOut`, `XMLout` / `CapabilitiesOut`
//! - ✅ Framing SOAP 1.1 (`SOAPAction`) ou 1.2 (paramètre `action`)
//!
//! ## Example
//!
//! ```
//! use wmlsoap::{EnvelopeDefaults, StoreOperation, StoreRequest, build_envelope, extract_response};
//!
//! let request = StoreRequest::new(
//!     StoreOperation::GetFromStore,
//!     Some(r#"<wells xmlns="http://www.witsml.org/schemas/131"><well uid=""/></wells>"#),
//! )?;
//! assert_eq!(request.wml_type.as_deref(), Some("well"));
//!
//! let envelope = build_envelope(&request, &EnvelopeDefaults::default());
//! assert!(envelope.contains("<WMLtypeIn>well</WMLtypeIn>"));
//!
//! let response = extract_response(
//!     "<Envelope><Body><Result>1</Result><XMLout>&lt;wells/&gt;</XMLout></Body></Envelope>",
//! )?;
//! assert_eq!(response.result, 1);
//! assert_eq!(response.xml_out, "<wells/>");
//! # Ok::<(), wmlsoap::SoapError>(())
//! ```

mod envelope;
mod error;
mod operation;
mod payload;
mod response;
mod version;

pub use envelope::{
    EnvelopeDefaults, SOAP_ENCODING_NS, SOAP_ENV_NS, StoreRequest, WITSML_MESSAGE_NS,
    build_envelope,
};
pub use error::SoapError;
pub use operation::{ACTION_URI_PREFIX, StoreOperation};
pub use payload::{escape_xml, extract_type};
pub use response::{StoreResponse, extract_response, pretty_xml};
pub use version::SoapVersion;
