//! Chiffrement des mots de passe WITSML stockés dans la configuration
//!
//! The key is derived from the machine identity, so an encrypted password
//! only decrypts on the machine that wrote it. Plaintext values are still
//! accepted everywhere a password is read.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use anyhow::{anyhow, Result};
use base64::Engine;
use sha2::{Digest, Sha256};
use std::{env, fs};
use tracing::warn;

/// Préfixe pour identifier les mots de passe chiffrés
const ENCRYPTED_PREFIX: &str = "encrypted:";

const KEY_SALT: &[u8] = b"wmls-config-encryption-v1";
const NONCE_SALT: &[u8] = b"wmls-nonce-v1";
const NONCE_LEN: usize = 12;

/// Returns a string identifying this machine
///
/// Linux machine-id first, then the host name. Containers often lack a
/// machine-id, the host name keeps encryption usable there.
fn machine_identity() -> Result<String> {
    for path in ["/etc/machine-id", "/var/lib/dbus/machine-id"] {
        if let Ok(id) = fs::read_to_string(path) {
            let id = id.trim();
            if !id.is_empty() {
                return Ok(id.to_string());
            }
        }
    }

    let hostname = fs::read_to_string("/etc/hostname")
        .ok()
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .or_else(|| env::var("HOSTNAME").ok())
        .or_else(|| env::var("COMPUTERNAME").ok())
        .filter(|h| !h.is_empty());

    match hostname {
        Some(h) => {
            warn!("No machine-id available, deriving the password key from the host name");
            Ok(h)
        }
        None => Err(anyhow!("Unable to identify this machine for password encryption")),
    }
}

/// Dérive une clé AES-256 à partir de l'identité de la machine
fn derive_key() -> Result<[u8; 32]> {
    let identity = machine_identity()?;

    let mut hasher = Sha256::new();
    hasher.update(identity.as_bytes());
    hasher.update(KEY_SALT);

    let mut key = [0u8; 32];
    key.copy_from_slice(&hasher.finalize());
    Ok(key)
}

fn cipher() -> Result<Aes256Gcm> {
    let key = derive_key()?;
    Aes256Gcm::new_from_slice(&key).map_err(|e| anyhow!("Failed to create cipher: {}", e))
}

/// Chiffre un mot de passe avec la clé dérivée de la machine
///
/// Returns `encrypted:BASE64(nonce || ciphertext)`. The nonce is derived from
/// the password, so the same password always gives the same value and the
/// config file does not churn when it is saved again.
pub fn encrypt_password(password: &str) -> Result<String> {
    let cipher = cipher()?;

    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(NONCE_SALT);
    let nonce_hash = hasher.finalize();
    let nonce_bytes = &nonce_hash[..NONCE_LEN];

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(nonce_bytes), password.as_bytes())
        .map_err(|e| anyhow!("Encryption failed: {}", e))?;

    let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    combined.extend_from_slice(nonce_bytes);
    combined.extend_from_slice(&ciphertext);

    Ok(format!(
        "{}{}",
        ENCRYPTED_PREFIX,
        base64::engine::general_purpose::STANDARD.encode(&combined)
    ))
}

/// Déchiffre un mot de passe au format `encrypted:BASE64`
///
/// # Errors
///
/// Invalid format, or a value encrypted on another machine.
pub fn decrypt_password(encrypted: &str) -> Result<String> {
    let base64_data = encrypted
        .strip_prefix(ENCRYPTED_PREFIX)
        .ok_or_else(|| anyhow!("Invalid encrypted password format (missing prefix)"))?;

    let combined = base64::engine::general_purpose::STANDARD
        .decode(base64_data)
        .map_err(|e| anyhow!("Invalid base64: {}", e))?;

    if combined.len() < NONCE_LEN {
        return Err(anyhow!("Invalid ciphertext (too short)"));
    }
    let (nonce, ciphertext) = combined.split_at(NONCE_LEN);

    let plaintext = cipher()?
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|e| anyhow!("Decryption failed (wrong machine or corrupted data): {}", e))?;

    String::from_utf8(plaintext).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
}

/// `true` when the value carries the `encrypted:` prefix
pub fn is_encrypted(value: &str) -> bool {
    value.starts_with(ENCRYPTED_PREFIX)
}

/// Obtient le mot de passe en clair, qu'il soit chiffré ou non
pub fn get_password(value: &str) -> Result<String> {
    if is_encrypted(value) {
        decrypt_password(value)
    } else {
        Ok(value.to_string())
    }
}
