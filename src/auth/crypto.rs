//! Authenticated encryption of the session cookie.
//!
//! Uses AES-256-GCM with a machine-derived key and no associated data.
//! The stored form is `BASE64(nonce || ciphertext)`, one fresh random nonce
//! per encryption.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::RngCore;
use thiserror::Error;

use super::kdf::DerivedKey;

/// Nonce length in bytes (96 bits for AES-GCM)
pub const NONCE_LENGTH: usize = 12;

/// Errors from sealing or opening a credential blob.
///
/// None of the variants carry plaintext.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Failed to create cipher")]
    Cipher,

    #[error("Encryption failed")]
    Encrypt,

    #[error("Invalid base64 payload")]
    Encoding(#[from] base64::DecodeError),

    #[error("Encrypted value too short")]
    TooShort,

    #[error("Decryption failed: invalid key or corrupted data")]
    Decrypt,

    #[error("Decrypted value is not valid UTF-8")]
    Utf8,
}

/// Encrypt `plaintext` and return `BASE64(nonce || ciphertext)`.
pub fn encrypt_secret(key: &DerivedKey, plaintext: &str) -> Result<String, CryptoError> {
    // Generate random nonce
    let mut nonce_bytes = [0u8; NONCE_LENGTH];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CryptoError::Cipher)?;
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|_| CryptoError::Encrypt)?;

    let mut combined = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
    combined.extend_from_slice(&nonce_bytes);
    combined.extend_from_slice(&ciphertext);

    Ok(BASE64.encode(&combined))
}

/// Decrypt a blob produced by [`encrypt_secret`].
///
/// Fails when the key differs from the one used to encrypt, when the payload
/// was modified, or when it is not valid base64.
pub fn decrypt_secret(key: &DerivedKey, blob: &str) -> Result<String, CryptoError> {
    let combined = BASE64.decode(blob.trim())?;

    // Tag alone is 16 bytes; anything not longer than the nonce can't be valid.
    if combined.len() <= NONCE_LENGTH {
        return Err(CryptoError::TooShort);
    }

    let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LENGTH);

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CryptoError::Cipher)?;
    let nonce = Nonce::from_slice(nonce_bytes);

    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CryptoError::Decrypt)?;

    String::from_utf8(plaintext).map_err(|_| CryptoError::Utf8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::fingerprint::MachineFingerprint;
    use crate::auth::kdf::{derive_key, KEY_LENGTH};

    fn test_key() -> DerivedKey {
        let mut key = [0u8; KEY_LENGTH];
        for (i, byte) in key.iter_mut().enumerate() {
            *byte = i as u8;
        }
        DerivedKey::from_bytes(key)
    }

    fn key_for(host: &str) -> DerivedKey {
        derive_key(
            &MachineFingerprint::from_components(&[host, "x86_64", "linux"]),
            None,
        )
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = test_key();
        let plaintext = "my-session-cookie-12345";

        let encrypted = encrypt_secret(&key, plaintext).unwrap();
        assert!(!encrypted.contains(plaintext));

        let decrypted = decrypt_secret(&key, &encrypted).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn roundtrip_under_derived_keys() {
        for host in ["laptop", "build-box", "ci-runner-7"] {
            for secret in ["a", "cookie with spaces", "Hello, 世界! 🎉"] {
                let key = key_for(host);
                let blob = encrypt_secret(&key, secret).unwrap();
                assert_eq!(decrypt_secret(&key, &blob).unwrap(), secret);
            }
        }
    }

    #[test]
    fn blob_layout_is_nonce_then_ciphertext() {
        let key = test_key();
        let blob = encrypt_secret(&key, "abc").unwrap();
        let raw = BASE64.decode(&blob).unwrap();
        // nonce + plaintext + 16-byte tag
        assert_eq!(raw.len(), NONCE_LENGTH + 3 + 16);
    }

    #[test]
    fn test_different_encryptions_differ() {
        let key = test_key();
        let plaintext = "same-data";

        let encrypted1 = encrypt_secret(&key, plaintext).unwrap();
        let encrypted2 = encrypt_secret(&key, plaintext).unwrap();

        // Different random nonces should produce different ciphertext
        assert_ne!(encrypted1, encrypted2);
        assert_eq!(decrypt_secret(&key, &encrypted1).unwrap(), plaintext);
        assert_eq!(decrypt_secret(&key, &encrypted2).unwrap(), plaintext);
    }

    #[test]
    fn blob_from_another_machine_fails() {
        let blob = encrypt_secret(&key_for("machine-one"), "secret").unwrap();
        let result = decrypt_secret(&key_for("machine-two"), &blob);
        assert!(matches!(result, Err(CryptoError::Decrypt)));
    }

    #[test]
    fn test_wrong_password_fails() {
        let fp = MachineFingerprint::from_components(&["host"]);
        let blob = encrypt_secret(&derive_key(&fp, Some("right")), "secret").unwrap();
        assert!(decrypt_secret(&derive_key(&fp, Some("wrong")), &blob).is_err());
        assert!(decrypt_secret(&derive_key(&fp, None), &blob).is_err());
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let key = test_key();
        let blob = encrypt_secret(&key, "secret").unwrap();
        let mut raw = BASE64.decode(&blob).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let tampered = BASE64.encode(&raw);
        assert!(matches!(
            decrypt_secret(&key, &tampered),
            Err(CryptoError::Decrypt)
        ));
    }

    #[test]
    fn malformed_payloads_fail() {
        let key = test_key();
        assert!(matches!(
            decrypt_secret(&key, "not base64!!"),
            Err(CryptoError::Encoding(_))
        ));
        assert!(matches!(
            decrypt_secret(&key, &BASE64.encode([0u8; 8])),
            Err(CryptoError::TooShort)
        ));
    }

    #[test]
    fn error_messages_do_not_echo_input() {
        let key = test_key();
        let err = decrypt_secret(&key, "SENSITIVE_PAYLOAD").unwrap_err();
        assert!(!err.to_string().contains("SENSITIVE"));
    }
}
