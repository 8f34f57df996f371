//! Extension pour intégrer le store WITSML dans wmlsconfig
//!
//! Ce module fournit le trait `WmlsConfigExt` qui ajoute à
//! `wmlsconfig::Config` les réglages de la section `store` :
//!
//! ```yaml
//! store:
//!   url: https://witsml.example.com/store
//!   username: driller
//!   password: encrypted:...   # or plaintext
//!   timeout_secs: 60
//!   body_timeout_secs: 0      # 0 = no limit on the body download
//!   soap_version: "1.1"
//!   options_in: ""
//!   capabilities_in: ""
//!   accept_invalid_certs: false
//! ```
//!
//! # Exemple
//!
//! ```no_run
//! use wmlsconfig::get_config;
//! use wmlsclient::{WmlsClient, WmlsConfigExt};
//!
//! # fn main() -> Result<(), wmlsclient::WmlsError> {
//! let config = get_config();
//! config.set_store_url("https://witsml.example.com/store".to_string())?;
//! config.set_store_password("s3cret")?; // stored encrypted
//!
//! let client = WmlsClient::from_config(&config)?;
//! # Ok(())
//! # }
//! ```

use crate::client::{ClientBuilder, DEFAULT_TIMEOUT_SECS, WmlsClient};
use crate::error::Result as ClientResult;
use anyhow::{Result, anyhow};
use serde_yaml::Value;
use std::time::Duration;
use wmlsconfig::Config;
use wmlsconfig::encryption::{encrypt_password, get_password};
use wmlsoap::SoapVersion;

const STORE: &str = "store";

/// Trait d'extension pour gérer la configuration du store dans wmlsconfig
///
/// Getters never write: a missing or mistyped value yields the default.
pub trait WmlsConfigExt {
    fn get_store_url(&self) -> Result<String>;
    fn set_store_url(&self, url: String) -> Result<()>;

    fn get_store_username(&self) -> Result<String>;
    fn set_store_username(&self, username: String) -> Result<()>;

    /// Password in clear, decrypted if it was stored encrypted
    fn get_store_password(&self) -> Result<String>;

    /// Store the password encrypted with the machine key
    fn set_store_password(&self, password: &str) -> Result<()>;

    /// Read timeout in seconds (default: 60)
    fn get_store_timeout_secs(&self) -> Result<u64>;
    fn set_store_timeout_secs(&self, secs: u64) -> Result<()>;

    /// Limit on the body download in seconds (default: 0, unbounded)
    fn get_store_body_timeout_secs(&self) -> Result<u64>;
    fn set_store_body_timeout_secs(&self, secs: u64) -> Result<()>;

    /// SOAP framing (default: 1.1)
    fn get_store_soap_version(&self) -> Result<SoapVersion>;
    fn set_store_soap_version(&self, version: SoapVersion) -> Result<()>;

    fn get_store_options_in(&self) -> Result<String>;
    fn set_store_options_in(&self, options_in: String) -> Result<()>;

    fn get_store_capabilities_in(&self) -> Result<String>;
    fn set_store_capabilities_in(&self, capabilities_in: String) -> Result<()>;

    /// Skip TLS certificate verification (default: false)
    fn get_store_accept_invalid_certs(&self) -> Result<bool>;
    fn set_store_accept_invalid_certs(&self, accept: bool) -> Result<()>;
}

fn get_u64(config: &Config, key: &str, default: u64) -> u64 {
    match config.get_value(&[STORE, key]) {
        Ok(Value::Number(n)) => n.as_u64().unwrap_or(default),
        Ok(Value::String(s)) => s.trim().parse().unwrap_or(default),
        _ => default,
    }
}

fn get_string(config: &Config, key: &str) -> Result<String> {
    match config.get_value(&[STORE, key]) {
        Ok(Value::String(s)) => Ok(s),
        Ok(Value::Number(n)) => Ok(n.to_string()),
        _ => Ok(String::new()),
    }
}

impl WmlsConfigExt for Config {
    fn get_store_url(&self) -> Result<String> {
        get_string(self, "url")
    }

    fn set_store_url(&self, url: String) -> Result<()> {
        self.set_value(&[STORE, "url"], Value::String(url))
    }

    fn get_store_username(&self) -> Result<String> {
        get_string(self, "username")
    }

    fn set_store_username(&self, username: String) -> Result<()> {
        self.set_value(&[STORE, "username"], Value::String(username))
    }

    fn get_store_password(&self) -> Result<String> {
        get_password(&get_string(self, "password")?)
    }

    fn set_store_password(&self, password: &str) -> Result<()> {
        let stored = if password.is_empty() {
            String::new()
        } else {
            encrypt_password(password)?
        };
        self.set_value(&[STORE, "password"], Value::String(stored))
    }

    fn get_store_timeout_secs(&self) -> Result<u64> {
        Ok(get_u64(self, "timeout_secs", DEFAULT_TIMEOUT_SECS))
    }

    fn set_store_timeout_secs(&self, secs: u64) -> Result<()> {
        self.set_value(
            &[STORE, "timeout_secs"],
            Value::Number(serde_yaml::Number::from(secs)),
        )
    }

    fn get_store_body_timeout_secs(&self) -> Result<u64> {
        Ok(get_u64(self, "body_timeout_secs", 0))
    }

    fn set_store_body_timeout_secs(&self, secs: u64) -> Result<()> {
        self.set_value(
            &[STORE, "body_timeout_secs"],
            Value::Number(serde_yaml::Number::from(secs)),
        )
    }

    fn get_store_soap_version(&self) -> Result<SoapVersion> {
        let raw = get_string(self, "soap_version")?;
        if raw.is_empty() {
            return Ok(SoapVersion::default());
        }
        raw.parse().map_err(|e: String| anyhow!(e))
    }

    fn set_store_soap_version(&self, version: SoapVersion) -> Result<()> {
        self.set_value(&[STORE, "soap_version"], Value::String(version.to_string()))
    }

    fn get_store_options_in(&self) -> Result<String> {
        get_string(self, "options_in")
    }

    fn set_store_options_in(&self, options_in: String) -> Result<()> {
        self.set_value(&[STORE, "options_in"], Value::String(options_in))
    }

    fn get_store_capabilities_in(&self) -> Result<String> {
        get_string(self, "capabilities_in")
    }

    fn set_store_capabilities_in(&self, capabilities_in: String) -> Result<()> {
        self.set_value(&[STORE, "capabilities_in"], Value::String(capabilities_in))
    }

    fn get_store_accept_invalid_certs(&self) -> Result<bool> {
        match self.get_value(&[STORE, "accept_invalid_certs"]) {
            Ok(Value::Bool(b)) => Ok(b),
            _ => Ok(false),
        }
    }

    fn set_store_accept_invalid_certs(&self, accept: bool) -> Result<()> {
        self.set_value(&[STORE, "accept_invalid_certs"], Value::Bool(accept))
    }
}

impl ClientBuilder {
    /// Builder preloaded from the `store` section of the configuration
    ///
    /// Every setting can still be overridden before [`ClientBuilder::build`].
    pub fn from_config(config: &Config) -> ClientResult<Self> {
        let body_timeout = match config.get_store_body_timeout_secs()? {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Ok(ClientBuilder::new(config.get_store_url()?)
            .credentials(config.get_store_username()?, config.get_store_password()?)
            .timeout(Duration::from_secs(config.get_store_timeout_secs()?))
            .body_timeout(body_timeout)
            .soap_version(config.get_store_soap_version()?)
            .options_in(config.get_store_options_in()?)
            .capabilities_in(config.get_store_capabilities_in()?)
            .accept_invalid_certs(config.get_store_accept_invalid_certs()?))
    }
}

impl WmlsClient {
    /// Client built from the `store` section of the configuration
    pub fn from_config(config: &Config) -> ClientResult<Self> {
        ClientBuilder::from_config(config)?.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn load(dir: &TempDir) -> Config {
        Config::load_config(dir.path().to_str().unwrap()).unwrap()
    }

    #[test]
    fn test_store_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load(&dir);

        assert_eq!(config.get_store_url().unwrap(), "");
        assert_eq!(config.get_store_password().unwrap(), "");
        assert_eq!(config.get_store_timeout_secs().unwrap(), DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.get_store_soap_version().unwrap(), SoapVersion::Soap11);
        assert!(!config.get_store_accept_invalid_certs().unwrap());
        assert_eq!(config.get_store_body_timeout_secs().unwrap(), 0);
    }

    #[test]
    fn test_certificate_policy_from_config() {
        let dir = TempDir::new().unwrap();
        let config = load(&dir);
        config
            .set_store_url("https://store.local/witsml".to_string())
            .unwrap();

        let builder = ClientBuilder::from_config(&config).unwrap();
        assert!(!builder.http_transport().accept_invalid_certs());

        config.set_store_accept_invalid_certs(true).unwrap();
        let builder = ClientBuilder::from_config(&config).unwrap();
        assert!(builder.http_transport().accept_invalid_certs());
    }

    #[test]
    fn test_body_timeout_from_config() {
        let dir = TempDir::new().unwrap();
        let config = load(&dir);
        config
            .set_store_url("http://store.local/witsml".to_string())
            .unwrap();
        assert_eq!(WmlsClient::from_config(&config).unwrap().body_timeout(), None);

        config.set_store_body_timeout_secs(900).unwrap();
        assert_eq!(
            WmlsClient::from_config(&config).unwrap().body_timeout(),
            Some(Duration::from_secs(900))
        );
    }

    #[test]
    fn test_password_is_stored_encrypted() {
        let dir = TempDir::new().unwrap();
        let config = load(&dir);
        config.set_store_password("s3cret").unwrap();

        let on_disk = fs::read_to_string(config.path()).unwrap();
        assert!(!on_disk.contains("s3cret"));
        assert!(on_disk.contains("encrypted:"));

        assert_eq!(load(&dir).get_store_password().unwrap(), "s3cret");
    }

    #[test]
    fn test_plaintext_password_is_accepted() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("config.yaml"),
            "store:\n  url: http://store.local/witsml\n  username: driller\n  password: plain\n  soap_version: '1.2'\n  timeout_secs: 5\n",
        )
        .unwrap();
        let config = load(&dir);

        assert_eq!(config.get_store_password().unwrap(), "plain");
        assert_eq!(config.get_store_soap_version().unwrap(), SoapVersion::Soap12);

        let client = WmlsClient::from_config(&config).unwrap();
        assert_eq!(client.url(), "http://store.local/witsml");
        assert_eq!(client.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_from_config_without_url_fails() {
        let dir = TempDir::new().unwrap();
        let config = load(&dir);
        assert!(matches!(
            WmlsClient::from_config(&config).unwrap_err(),
            crate::WmlsError::InvalidUrl(_)
        ));
    }

    #[test]
    fn test_bad_soap_version() {
        let dir = TempDir::new().unwrap();
        let config = load(&dir);
        config
            .set_value(&["store", "soap_version"], Value::String("3".into()))
            .unwrap();
        assert!(config.get_store_soap_version().is_err());
    }
}
