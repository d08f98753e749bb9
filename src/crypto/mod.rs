//! AES-256-GCM encryption for credential private configuration.
//!
//! The store persists each credential's private config as one encrypted
//! JSON blob with its own random nonce. The master key is 32 bytes,
//! base64-encoded, and supplied through the environment; it never touches
//! disk.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::{Map, Value};

/// Master key size in bytes (256 bits).
const KEY_SIZE: usize = 32;

/// Decodes and checks the base64 master key.
pub fn validate_key(key_base64: &str) -> Result<Vec<u8>> {
    let key_bytes = BASE64
        .decode(key_base64)
        .context("Failed to decode base64 encryption key")?;

    if key_bytes.len() != KEY_SIZE {
        return Err(anyhow!(
            "Encryption key must be {} bytes (256 bits), got {} bytes",
            KEY_SIZE,
            key_bytes.len()
        ));
    }

    Ok(key_bytes)
}

/// Encrypts a private-config object.
///
/// Returns `(ciphertext, nonce)`, both base64-encoded for storage. The
/// nonce is random per call and must be kept alongside the ciphertext.
pub fn encrypt_config(config: &Map<String, Value>, key: &[u8]) -> Result<(String, String)> {
    if key.len() != KEY_SIZE {
        return Err(anyhow!("Encryption key must be {} bytes", KEY_SIZE));
    }

    let plaintext =
        serde_json::to_vec(config).context("Failed to serialize private config")?;

    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| anyhow!("Failed to create cipher: {}", e))?;
    let nonce_bytes = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext_bytes = cipher
        .encrypt(&nonce_bytes, plaintext.as_slice())
        .map_err(|e| anyhow!("Encryption failed: {}", e))?;

    Ok((BASE64.encode(&ciphertext_bytes), BASE64.encode(nonce_bytes)))
}

/// Decrypts a private-config object stored by [`encrypt_config`].
///
/// Fails if the key or nonce does not match, or the ciphertext was
/// tampered with (GCM authentication).
pub fn decrypt_config(ciphertext: &str, nonce: &str, key: &[u8]) -> Result<Map<String, Value>> {
    if key.len() != KEY_SIZE {
        return Err(anyhow!("Encryption key must be {} bytes", KEY_SIZE));
    }

    let ciphertext_bytes = BASE64
        .decode(ciphertext)
        .context("Failed to decode base64 ciphertext")?;
    let nonce_bytes = BASE64
        .decode(nonce)
        .context("Failed to decode base64 nonce")?;

    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| anyhow!("Failed to create cipher: {}", e))?;
    let nonce = Nonce::from_slice(&nonce_bytes);

    let plaintext = cipher
        .decrypt(nonce, ciphertext_bytes.as_slice())
        .map_err(|_| anyhow!("Decryption failed: wrong key or corrupted data"))?;

    serde_json::from_slice(&plaintext).context("Decrypted private config is not a JSON object")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_key() -> Vec<u8> {
        vec![7u8; KEY_SIZE]
    }

    fn sample_config() -> Map<String, Value> {
        let mut config = Map::new();
        config.insert("api_key".to_string(), json!("secret-key-1234567890"));
        config
    }

    #[test]
    fn test_round_trip() {
        let key = test_key();
        let config = sample_config();

        let (ciphertext, nonce) = encrypt_config(&config, &key).unwrap();
        let decrypted = decrypt_config(&ciphertext, &nonce, &key).unwrap();
        assert_eq!(decrypted, config);
    }

    #[test]
    fn test_unique_nonce_per_call() {
        let key = test_key();
        let config = sample_config();

        let (c1, n1) = encrypt_config(&config, &key).unwrap();
        let (c2, n2) = encrypt_config(&config, &key).unwrap();
        assert_ne!(n1, n2);
        assert_ne!(c1, c2);
    }

    #[test]
    fn test_wrong_key_fails() {
        let config = sample_config();
        let (ciphertext, nonce) = encrypt_config(&config, &test_key()).unwrap();
        let result = decrypt_config(&ciphertext, &nonce, &vec![9u8; KEY_SIZE]);
        assert!(result.is_err());
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let config = sample_config();
        let (ciphertext, nonce) = encrypt_config(&config, &test_key()).unwrap();
        let mut bytes = BASE64.decode(&ciphertext).unwrap();
        bytes[0] ^= 0xff;
        let tampered = BASE64.encode(&bytes);
        assert!(decrypt_config(&tampered, &nonce, &test_key()).is_err());
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key(&BASE64.encode([0u8; 32])).is_ok());
        assert!(validate_key(&BASE64.encode([0u8; 16])).is_err());
        assert!(validate_key("not-valid-base64!@#$").is_err());
    }
}
