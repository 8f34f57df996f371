//! WITSML Store client library
//!
//! This crate provides a blocking client for the WITSML Store API (WMLS),
//! the SOAP interface used to exchange well, wellbore and log data with a
//! remote store.
//!
//! # Features
//!
//! - **Store operations**: `WMLS_AddToStore`, `WMLS_DeleteFromStore`,
//!   `WMLS_UpdateInStore`, `WMLS_GetFromStore` and `WMLS_GetCap`
//! - **Type derivation**: the `WMLtypeIn` is taken from the template root
//! - **SOAP 1.1 or 1.2 framing**, chosen once when the client is built
//! - **HTTP Basic authentication** and a configurable read timeout
//! - **Configuration Extension**: build a client from the `store` section of
//!   `wmlsconfig` (passwords stored encrypted)
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use wmlsclient::{SoapVersion, WmlsClient};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = WmlsClient::builder("https://witsml.example.com/store")
//!         .credentials("driller", "s3cret")
//!         .timeout(Duration::from_secs(30))
//!         .soap_version(SoapVersion::Soap11)
//!         .build()?;
//!
//!     let caps = client.get_cap(Some("dataVersion=1.3.1.1"), &[])?;
//!     println!("{}", caps.xml_out);
//!
//!     let logs = client.get_from_store(
//!         r#"<logs xmlns="http://www.witsml.org/schemas/131" version="1.3.1.1"><log uidWell="W-1" uidWellbore="B-1" uid=""/></logs>"#,
//!         None,
//!         &[],
//!     )?;
//!     println!("result={} {}", logs.result, logs.supp_msg);
//!     Ok(())
//! }
//! ```
//!
//! # Result codes
//!
//! The store's `Result` is returned as is: `<= 0` means the store refused the
//! request, `> 0` means success (or a count). Only transport-level problems
//! become [`WmlsError`]s.

pub mod client;
pub mod error;
pub mod transport;

#[cfg(feature = "wmlsconfig")]
pub mod config_ext;

// Re-exports
pub use client::{ClientBuilder, DEFAULT_TIMEOUT_SECS, WmlsClient};
pub use error::{Result, WmlsError};
pub use transport::{HttpTransport, SoapCall, Transport};
pub use wmlsoap::{SoapVersion, StoreOperation, StoreRequest, StoreResponse};

#[cfg(feature = "wmlsconfig")]
pub use config_ext::WmlsConfigExt;
