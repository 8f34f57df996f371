//! The five verbs of the WITSML Store interface

use std::fmt;
use std::str::FromStr;

/// Prefix shared by every Store SOAP action URI.
pub const ACTION_URI_PREFIX: &str = "http://www.witsml.org/action/120/Store.";

/// A WITSML Store operation.
///
/// Each variant knows the names it uses on the wire: the body element, the
/// payload field (if any), the SOAP action URI and the response field that
/// carries the returned document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    AddToStore,
    DeleteFromStore,
    UpdateInStore,
    GetFromStore,
    GetCap,
}

impl StoreOperation {
    pub const ALL: [StoreOperation; 5] = [
        StoreOperation::AddToStore,
        StoreOperation::DeleteFromStore,
        StoreOperation::UpdateInStore,
        StoreOperation::GetFromStore,
        StoreOperation::GetCap,
    ];

    /// Local name of the body element, e.g. `WMLS_AddToStore`.
    pub fn body_element(&self) -> &'static str {
        match self {
            StoreOperation::AddToStore => "WMLS_AddToStore",
            StoreOperation::DeleteFromStore => "WMLS_DeleteFromStore",
            StoreOperation::UpdateInStore => "WMLS_UpdateInStore",
            StoreOperation::GetFromStore => "WMLS_GetFromStore",
            StoreOperation::GetCap => "WMLS_GetCap",
        }
    }

    /// Name of the field that carries the escaped template.
    ///
    /// Add and update send a document (`XMLin`), delete and get send a query
    /// (`QueryIn`). `GetCap` has no payload.
    pub fn payload_field(&self) -> Option<&'static str> {
        match self {
            StoreOperation::AddToStore | StoreOperation::UpdateInStore => Some("XMLin"),
            StoreOperation::DeleteFromStore | StoreOperation::GetFromStore => Some("QueryIn"),
            StoreOperation::GetCap => None,
        }
    }

    pub fn requires_payload(&self) -> bool {
        self.payload_field().is_some()
    }

    /// SOAP action URI, e.g. `http://www.witsml.org/action/120/Store.WMLS_GetCap`.
    pub fn action_uri(&self) -> String {
        format!("{}{}", ACTION_URI_PREFIX, self.body_element())
    }

    /// Response element holding the returned document.
    pub fn output_field(&self) -> &'static str {
        match self {
            StoreOperation::GetCap => "CapabilitiesOut",
            _ => "XMLout",
        }
    }
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.body_element())
    }
}

impl FromStr for StoreOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let name = lowered.strip_prefix("wmls_").unwrap_or(&lowered);
        match name {
            "add" | "addtostore" => Ok(StoreOperation::AddToStore),
            "delete" | "deletefromstore" => Ok(StoreOperation::DeleteFromStore),
            "update" | "updateinstore" => Ok(StoreOperation::UpdateInStore),
            "get" | "getfromstore" => Ok(StoreOperation::GetFromStore),
            "cap" | "getcap" => Ok(StoreOperation::GetCap),
            _ => Err(format!("unknown store operation '{}'", s)),
        }
    }
}
