//! Symmetric encryption for stored Flex credentials.
//!
//! Blob format: hex(nonce || ciphertext+tag). The key is provided as a
//! hex-encoded 32-byte string and must round-trip exactly; a tampered blob
//! or wrong key fails authentication.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::errors::{Error, Result};

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

pub struct CredentialCipher {
    cipher: ChaCha20Poly1305,
}

impl CredentialCipher {
    /// Builds a cipher from a hex-encoded 32-byte key.
    pub fn from_hex_key(hex_key: &str) -> Result<Self> {
        let key = hex::decode(hex_key.trim())
            .map_err(|e| Error::Secret(format!("encryption key is not valid hex: {e}")))?;
        if key.len() != KEY_LEN {
            return Err(Error::Secret(format!(
                "encryption key must decode to {KEY_LEN} bytes, got {}",
                key.len()
            )));
        }
        Ok(Self {
            cipher: ChaCha20Poly1305::new(Key::from_slice(&key)),
        })
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| Error::Secret(format!("encryption failed: {e}")))?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);
        Ok(hex::encode(blob))
    }

    pub fn decrypt(&self, blob: &str) -> Result<String> {
        let raw = hex::decode(blob.trim())
            .map_err(|e| Error::Secret(format!("credential blob is not valid hex: {e}")))?;
        if raw.len() < NONCE_LEN {
            return Err(Error::Secret("credential blob too short".to_string()));
        }
        let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| Error::Secret("credential blob failed authentication".to_string()))?;
        String::from_utf8(plaintext)
            .map_err(|e| Error::Secret(format!("decrypted credential is not UTF-8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    #[test]
    fn round_trips_exactly() {
        let cipher = CredentialCipher::from_hex_key(TEST_KEY).unwrap();
        let blob = cipher.encrypt("flex-token-123").unwrap();
        assert_eq!(cipher.decrypt(&blob).unwrap(), "flex-token-123");
    }

    #[test]
    fn distinct_nonces_give_distinct_blobs() {
        let cipher = CredentialCipher::from_hex_key(TEST_KEY).unwrap();
        let a = cipher.encrypt("same").unwrap();
        let b = cipher.encrypt("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn tampered_blob_fails_authentication() {
        let cipher = CredentialCipher::from_hex_key(TEST_KEY).unwrap();
        let mut blob = cipher.encrypt("secret").unwrap();
        // Flip the last hex digit.
        let last = blob.pop().unwrap();
        blob.push(if last == '0' { '1' } else { '0' });
        assert!(cipher.decrypt(&blob).is_err());
    }

    #[test]
    fn rejects_short_keys() {
        assert!(CredentialCipher::from_hex_key("deadbeef").is_err());
        assert!(CredentialCipher::from_hex_key("zz").is_err());
    }
}
