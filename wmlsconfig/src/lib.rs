//! # WMLS Configuration Module
//!
//! This module provides configuration management for the WITSML store client:
//! - Loading configuration from a YAML file
//! - Merging with embedded default configuration
//! - Environment variable overrides
//! - Type-safe getters and setters for configuration values
//! - Thread-safe singleton access pattern
//!
//! Store-specific settings (endpoint, credentials, timeout...) are exposed by
//! the `WmlsConfigExt` extension trait of the `wmlsclient` crate.
//!
//! ## Usage
//!
//! ```no_run
//! use wmlsconfig::get_config;
//!
//! let config = get_config();
//! let level = config.get_log_min_level()?;
//! config.set_log_min_level("DEBUG".to_string())?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{anyhow, Result};
use dirs::home_dir;
use lazy_static::lazy_static;
use serde_yaml::{Mapping, Value};
use std::{
    env, fs,
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tracing::{info, warn};

// Module de chiffrement des mots de passe
pub mod encryption;

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("wmls.yaml");

lazy_static! {
    static ref CONFIG: Arc<Config> = Arc::new(Config::load_or_default(""));
}

const ENV_CONFIG_DIR: &str = "WMLS_CONFIG";
const ENV_PREFIX: &str = "WMLS_CONFIG__";
const CONFIG_DIR_NAME: &str = ".wmls";
const CONFIG_FILE_NAME: &str = "config.yaml";

// Default values for configuration
const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";
const DEFAULT_LOG_ENABLE_CONSOLE: bool = true;

/// Macro to generate getter/setter for bool values with default
macro_rules! impl_bool_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<bool> {
            match self.get_value($path) {
                Ok(Value::Bool(b)) => Ok(b),
                _ => Ok($default),
            }
        }

        pub fn $setter(&self, value: bool) -> Result<()> {
            self.set_value($path, Value::Bool(value))
        }
    };
}

/// Macro to generate getter/setter for string values with default
macro_rules! impl_string_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<String> {
            match self.get_value($path) {
                Ok(Value::String(s)) => Ok(s),
                _ => Ok($default.to_string()),
            }
        }

        pub fn $setter(&self, value: String) -> Result<()> {
            self.set_value($path, Value::String(value))
        }
    };
}

/// Configuration manager for the WITSML store client
///
/// This structure manages the client configuration, including:
/// - Loading configuration from YAML files
/// - Merging with default configuration
/// - Handling environment variable overrides
/// - Providing typed getters/setters for configuration values
#[derive(Debug)]
pub struct Config {
    config_dir: String,
    path: String,
    data: Mutex<Value>,
}

// Implémentation manuelle de Clone
impl Clone for Config {
    fn clone(&self) -> Self {
        let data = self.data().clone();
        Self {
            config_dir: self.config_dir.clone(),
            path: self.path.clone(),
            data: Mutex::new(data),
        }
    }
}

impl Config {
    /// Finds a config directory by trying different locations in order
    ///
    /// 1. The provided `directory` parameter if not empty
    /// 2. The `WMLS_CONFIG` environment variable
    /// 3. `.wmls` in the current directory
    /// 4. `.wmls` in the user's home directory (also the fallback)
    pub fn find_config_dir(directory: &str) -> String {
        if !directory.is_empty() {
            return directory.to_string();
        }

        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Trying to load config from env");
            return env_path;
        }

        if Path::new(CONFIG_DIR_NAME).exists() {
            return CONFIG_DIR_NAME.to_string();
        }

        match home_dir() {
            Some(home) => home.join(CONFIG_DIR_NAME).to_string_lossy().to_string(),
            None => CONFIG_DIR_NAME.to_string(),
        }
    }

    /// Loads the configuration from the specified directory
    ///
    /// This method:
    /// 1. Determines the configuration directory
    /// 2. Loads the default embedded configuration
    /// 3. Merges it with the external config.yaml file if present
    /// 4. Applies environment variable overrides
    ///
    /// Nothing is written to disk until a value is set or [`Config::save`] is called.
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::find_config_dir(directory);
        info!(config_dir = %config_dir, "Using config directory");

        let path = Path::new(&config_dir)
            .join(CONFIG_FILE_NAME)
            .to_string_lossy()
            .to_string();

        let mut config_value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        match fs::read(&path) {
            Ok(data) => {
                info!(config_file = %path, "Loaded config file");
                let external_value: Value = serde_yaml::from_slice(&data)?;
                merge_yaml(&mut config_value, &Self::lower_keys_value(external_value));
            }
            Err(_) => {
                info!(config_file = %path, "Config file not found, using default embedded config");
            }
        }

        let mut config_value = Self::lower_keys_value(config_value);
        Self::apply_env_overrides(&mut config_value);

        Ok(Config {
            config_dir,
            path,
            data: Mutex::new(config_value),
        })
    }

    /// Loads the configuration, falling back to the embedded defaults when
    /// the file cannot be read or parsed
    pub fn load_or_default(directory: &str) -> Self {
        match Self::load_config(directory) {
            Ok(config) => config,
            Err(err) => {
                warn!(error = %err, "Failed to load configuration, using embedded defaults");
                let config_dir = Self::find_config_dir(directory);
                let path = Path::new(&config_dir)
                    .join(CONFIG_FILE_NAME)
                    .to_string_lossy()
                    .to_string();
                let mut value = serde_yaml::from_str(DEFAULT_CONFIG).unwrap_or(Value::Null);
                Self::apply_env_overrides(&mut value);
                Config {
                    config_dir,
                    path,
                    data: Mutex::new(value),
                }
            }
        }
    }

    /// Directory holding `config.yaml`
    pub fn config_dir(&self) -> &str {
        &self.config_dir
    }

    /// Full path of `config.yaml`
    pub fn path(&self) -> &str {
        &self.path
    }

    fn data(&self) -> MutexGuard<'_, Value> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Saves the current configuration to the config.yaml file
    ///
    /// The configuration directory is created if it doesn't exist.
    pub fn save(&self) -> Result<()> {
        let dir = Path::new(&self.config_dir);
        if !dir.exists() {
            fs::create_dir_all(dir)?;
            info!(directory = %dir.display(), "Created config directory");
        }
        if !dir.is_dir() {
            return Err(anyhow!("{} is not a directory", self.config_dir));
        }

        let yaml = serde_yaml::to_string(&*self.data())?;
        fs::write(&self.path, yaml)?;
        Ok(())
    }

    /// Sets a configuration value at the specified path and saves it
    ///
    /// # Arguments
    ///
    /// * `path` - Array of keys representing the path (e.g., `&["store", "url"]`)
    /// * `value` - The YAML value to set
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        {
            let mut data = self.data();
            Self::set_value_internal(&mut data, path, value)?;
        }
        self.save()
    }

    fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
        if path.is_empty() {
            *data = value;
            return Ok(());
        }
        if let Value::Mapping(map) = data {
            let key_value = Value::String(path[0].to_lowercase());
            if path.len() == 1 {
                map.insert(key_value, value);
            } else {
                let entry = map
                    .entry(key_value)
                    .or_insert(Value::Mapping(Mapping::new()));
                Self::set_value_internal(entry, &path[1..], value)?;
            }
            Ok(())
        } else {
            Err(anyhow!("Current node is not a map"))
        }
    }

    /// Gets a configuration value at the specified path
    ///
    /// Returns an error if the path doesn't exist.
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.data();
        Self::get_value_internal(&data, path)
    }

    fn get_value_internal(data: &Value, path: &[&str]) -> Result<Value> {
        let mut current = data;
        for (i, key) in path.iter().enumerate() {
            if let Value::Mapping(map) = current {
                if let Some(next) = map.get(Value::String(key.to_lowercase())) {
                    current = next;
                } else {
                    return Err(anyhow!("Path {} does not exist", path[..=i].join(".")));
                }
            } else {
                return Err(anyhow!("Path {} is not a Config", path[..i].join(".")));
            }
        }
        Ok(current.clone())
    }

    fn apply_env_overrides(config: &mut Value) {
        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                let key_path = stripped.split("__").collect::<Vec<_>>();
                let yaml_value = Self::convert_env_value(&value);
                if let Err(err) = Self::set_value_internal(config, &key_path, yaml_value) {
                    warn!(env_var = %key, error = %err, "Ignoring environment override");
                }
            }
        }
    }

    fn convert_env_value(value: &str) -> Value {
        match serde_yaml::from_str::<Value>(value) {
            // Une valeur vide est parsée comme null, on garde la chaîne vide
            Ok(Value::Null) => Value::String(value.to_string()),
            Ok(parsed) => parsed,
            Err(_) => Value::String(value.to_string()),
        }
    }

    fn lower_keys_value(value: Value) -> Value {
        match value {
            Value::Mapping(map) => {
                let mut new_map = Mapping::new();
                for (k, v) in map {
                    let new_key = match k {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    };
                    new_map.insert(new_key, Self::lower_keys_value(v));
                }
                Value::Mapping(new_map)
            }
            Value::Sequence(seq) => {
                Value::Sequence(seq.into_iter().map(Self::lower_keys_value).collect())
            }
            _ => value,
        }
    }

    impl_bool_config!(
        get_log_enable_console,
        set_log_enable_console,
        &["host", "logger", "enable_console"],
        DEFAULT_LOG_ENABLE_CONSOLE
    );

    impl_string_config!(
        get_log_min_level,
        set_log_min_level,
        &["host", "logger", "min_level"],
        DEFAULT_LOG_MIN_LEVEL
    );
}

/// Returns the global configuration instance
///
/// The instance is lazily loaded on first access from the default location
/// (see [`Config::find_config_dir`]).
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

/// Merges external YAML configuration into default configuration
///
/// - For mappings (objects), it merges keys from external into default
/// - For scalars and sequences, external values replace default values
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(), // pour les scalaires ou séquences, on remplace
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn load(dir: &TempDir) -> Config {
        Config::load_config(dir.path().to_str().unwrap()).unwrap()
    }

    #[test]
    fn test_defaults_without_file() {
        let dir = TempDir::new().unwrap();
        let config = load(&dir);

        assert_eq!(
            config.get_value(&["store", "timeout_secs"]).unwrap(),
            Value::Number(60.into())
        );
        assert_eq!(config.get_log_min_level().unwrap(), "INFO");
        assert!(config.get_log_enable_console().unwrap());
        // Loading alone must not create the file
        assert!(!Path::new(config.path()).exists());
    }

    #[test]
    fn test_file_is_merged_over_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("config.yaml"),
            "Store:\n  URL: https://witsml.example.com/store\n  Timeout_Secs: 15\n",
        )
        .unwrap();

        let config = load(&dir);
        assert_eq!(
            config.get_value(&["store", "url"]).unwrap(),
            Value::String("https://witsml.example.com/store".into())
        );
        assert_eq!(
            config.get_value(&["STORE", "timeout_secs"]).unwrap(),
            Value::Number(15.into())
        );
        // untouched default survives the merge
        assert_eq!(
            config.get_value(&["store", "soap_version"]).unwrap(),
            Value::String("1.1".into())
        );
    }

    #[test]
    fn test_set_value_persists() {
        let dir = TempDir::new().unwrap();
        let config = load(&dir);
        config
            .set_value(&["store", "username"], Value::String("driller".into()))
            .unwrap();
        config.set_log_min_level("DEBUG".to_string()).unwrap();

        let reloaded = load(&dir);
        assert_eq!(
            reloaded.get_value(&["store", "username"]).unwrap(),
            Value::String("driller".into())
        );
        assert_eq!(reloaded.get_log_min_level().unwrap(), "DEBUG");
    }

    #[test]
    fn test_missing_path() {
        let dir = TempDir::new().unwrap();
        let config = load(&dir);
        let err = config.get_value(&["store", "nope"]).unwrap_err();
        assert!(err.to_string().contains("store.nope"));
    }

    #[test]
    fn test_save_creates_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested").join(".wmls");
        let config = Config::load_config(nested.to_str().unwrap()).unwrap();
        config.save().unwrap();
        assert!(nested.join("config.yaml").exists());
    }

    #[test]
    fn test_env_override() {
        let dir = TempDir::new().unwrap();
        env::set_var("WMLS_CONFIG__TESTENV__PORT", "4242");
        env::set_var("WMLS_CONFIG__TESTENV__EMPTY", "");
        let config = load(&dir);
        env::remove_var("WMLS_CONFIG__TESTENV__PORT");
        env::remove_var("WMLS_CONFIG__TESTENV__EMPTY");

        assert_eq!(
            config.get_value(&["testenv", "port"]).unwrap(),
            Value::Number(4242.into())
        );
        assert_eq!(
            config.get_value(&["testenv", "empty"]).unwrap(),
            Value::String(String::new())
        );
    }

    #[test]
    fn test_merge_yaml_replaces_scalars() {
        let mut default: Value = serde_yaml::from_str("a: 1\nb:\n  c: 2\n  d: 3\n").unwrap();
        let external: Value = serde_yaml::from_str("b:\n  c: 20\ne: 5\n").unwrap();
        merge_yaml(&mut default, &external);
        let expected: Value = serde_yaml::from_str("a: 1\nb:\n  c: 20\n  d: 3\ne: 5\n").unwrap();
        assert_eq!(default, expected);
    }
}
