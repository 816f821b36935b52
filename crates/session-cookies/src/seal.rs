//! Session cookie sealing helpers.
//!
//! Cookie payloads use ChaCha20-Poly1305 with a 32-byte key and 12-byte
//! nonce. The nonce and ciphertext are concatenated and exported as a single
//! URL-safe base64 string so the sealed value is a valid cookie octet
//! sequence.

use base64::Engine;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use thiserror::Error;

const BASE64: base64::engine::GeneralPurpose = base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// Nonce size for ChaCha20-Poly1305 (96 bits).
const NONCE_SIZE: usize = 12;
/// Sealing key size (256 bits).
pub const COOKIE_KEY_SIZE: usize = 32;

/// Domain-separation info for the cookie key derivation.
const COOKIE_KEY_INFO: &[u8] = b"outstatic.session-cookie.v1";

/// Errors returned by the sealing helpers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SealError {
    #[error("base64 decode failed: {0}")]
    Base64Decode(String),
    #[error("sealed value too short: {0} bytes")]
    Truncated(usize),
    #[error("encryption failed: {0}")]
    Seal(String),
    #[error("decryption failed: {0}")]
    Open(String),
}

/// Derive the cookie sealing key from the deployment's cookie secret.
///
/// HKDF-SHA256 with a fixed info string, so rotating the secret rotates the
/// key and invalidates every outstanding session cookie at once.
pub fn derive_cookie_key(secret: &str) -> [u8; COOKIE_KEY_SIZE] {
    let hk = Hkdf::<Sha256>::new(None, secret.as_bytes());
    let mut key = [0u8; COOKIE_KEY_SIZE];
    hk.expand(COOKIE_KEY_INFO, &mut key)
        .expect("32 bytes is a valid HKDF-SHA256 output length");
    key
}

/// Seal a plaintext payload into an opaque cookie value.
pub fn seal(key: &[u8; COOKIE_KEY_SIZE], plaintext: &[u8]) -> Result<String, SealError> {
    let mut nonce = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce);
    seal_with_nonce(key, &nonce, plaintext)
}

/// Seal with a caller-provided nonce.
///
/// This is primarily intended for deterministic tests.
pub fn seal_with_nonce(
    key: &[u8; COOKIE_KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    plaintext: &[u8],
) -> Result<String, SealError> {
    let cipher = ChaCha20Poly1305::new_from_slice(key)
        .map_err(|e| SealError::Seal(e.to_string()))?;
    let nonce_ref = Nonce::from_slice(nonce);

    let ciphertext = cipher
        .encrypt(nonce_ref, plaintext)
        .map_err(|e| SealError::Seal(e.to_string()))?;

    let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    combined.extend_from_slice(nonce);
    combined.extend_from_slice(&ciphertext);

    Ok(BASE64.encode(combined))
}

/// Open a sealed cookie value back into its plaintext payload.
pub fn open(key: &[u8; COOKIE_KEY_SIZE], sealed: &str) -> Result<Vec<u8>, SealError> {
    let combined = BASE64
        .decode(sealed)
        .map_err(|e| SealError::Base64Decode(e.to_string()))?;

    if combined.len() <= NONCE_SIZE {
        return Err(SealError::Truncated(combined.len()));
    }
    let (nonce, ciphertext) = combined.split_at(NONCE_SIZE);

    let cipher = ChaCha20Poly1305::new_from_slice(key)
        .map_err(|e| SealError::Open(e.to_string()))?;
    let nonce_ref = Nonce::from_slice(nonce);

    cipher
        .decrypt(nonce_ref, ciphertext)
        .map_err(|e| SealError::Open(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_round_trip() {
        let key = derive_cookie_key("test-secret");
        let sealed = seal(&key, b"hello session").unwrap();
        let opened = open(&key, &sealed).unwrap();
        assert_eq!(opened, b"hello session");
    }

    #[test]
    fn sealed_value_is_cookie_safe() {
        let key = derive_cookie_key("test-secret");
        let sealed = seal(&key, b"payload with spaces; and = signs").unwrap();
        assert!(sealed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn wrong_key_fails_to_open() {
        let key = derive_cookie_key("test-secret");
        let other = derive_cookie_key("other-secret");
        let sealed = seal(&key, b"hello").unwrap();
        assert!(matches!(open(&other, &sealed), Err(SealError::Open(_))));
    }

    #[test]
    fn tampered_value_fails_to_open() {
        let key = derive_cookie_key("test-secret");
        let sealed = seal(&key, b"hello").unwrap();
        let mut bytes = sealed.into_bytes();
        let last = bytes.len() - 1;
        bytes[last] = if bytes[last] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();
        assert!(open(&key, &tampered).is_err());
    }

    #[test]
    fn truncated_value_is_rejected() {
        let key = derive_cookie_key("test-secret");
        let sealed = BASE64.encode([0u8; NONCE_SIZE]);
        assert_eq!(
            open(&key, &sealed),
            Err(SealError::Truncated(NONCE_SIZE))
        );
    }

    #[test]
    fn key_derivation_is_deterministic() {
        assert_eq!(derive_cookie_key("abc"), derive_cookie_key("abc"));
        assert_ne!(derive_cookie_key("abc"), derive_cookie_key("abd"));
    }

    #[test]
    fn nonces_differ_between_seals() {
        let key = derive_cookie_key("test-secret");
        let a = seal(&key, b"same payload").unwrap();
        let b = seal(&key, b"same payload").unwrap();
        assert_ne!(a, b);
    }
}
