//! RSA PKCS#1 v1.5 encryption and decryption of individual string fields.
//!
//! **Padding choice:** encryption supports two strategies selected once per
//! invocation. [`PaddingMode::ZeroPadding`] draws the PKCS#1 filler bytes from
//! a ChaCha20 stream keyed with an all-zero seed, so identical plaintext and
//! key always produce identical ciphertext (searchable, reproducible output).
//! [`PaddingMode::RandomPadding`] uses the thread CSPRNG as PKCS#1 intends.
//!
//! Both produce standard type-2 blocks, so decryption is one fixed scheme.
//! **Zero padding leaks plaintext equality.** Use random padding whenever the
//! output does not need to be matched against other ciphertext.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand_chacha::{rand_core::SeedableRng, ChaCha20Rng};
use rsa::{traits::PublicKeyParts, Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use thiserror::Error;

/// Bytes of PKCS#1 v1.5 overhead: `0x00 0x02`, at least 8 filler bytes, `0x00`.
pub const PKCS1_OVERHEAD: usize = 11;

/// Seed of the filler stream used by [`PaddingMode::ZeroPadding`].
const ZERO_SEED: [u8; 32] = [0u8; 32];

/// Errors produced by the cipher layer for a single field.
///
/// These never abort a stream; the caller keeps the original field value.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The selected field holds a non-string JSON value.
    #[error("field value is not text")]
    NotText,

    /// The stored value is not valid base64.
    #[error("value is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The plaintext does not fit in one RSA block for this key.
    #[error("plaintext of {len} bytes exceeds the {max}-byte limit of this key")]
    PlaintextTooLong { len: usize, max: usize },

    /// RSA encryption or decryption failed (size mismatch, bad padding).
    #[error("rsa operation failed: {0}")]
    Rsa(#[from] rsa::Error),

    /// Decryption succeeded but the plaintext is not UTF-8 text.
    #[error("decrypted value is not valid UTF-8")]
    NotUtf8,
}

/// Padding strategy applied when encrypting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaddingMode {
    /// Deterministic filler: same plaintext, same ciphertext.
    #[default]
    ZeroPadding,
    /// Randomized filler: every call yields fresh ciphertext.
    RandomPadding,
}

impl PaddingMode {
    /// Map the `randpadding` invocation flag to a strategy.
    pub fn from_random_flag(randpadding: bool) -> Self {
        if randpadding {
            PaddingMode::RandomPadding
        } else {
            PaddingMode::ZeroPadding
        }
    }

    /// Encrypt `plaintext` with `key` using this padding strategy.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::PlaintextTooLong`] if `plaintext` exceeds
    /// [`max_plaintext_len`] for `key`, or [`TransformError::Rsa`] on an
    /// internal RSA failure.
    pub fn encrypt(self, plaintext: &[u8], key: &RsaPublicKey) -> Result<Vec<u8>, TransformError> {
        let max = max_plaintext_len(key);
        if plaintext.len() > max {
            return Err(TransformError::PlaintextTooLong {
                len: plaintext.len(),
                max,
            });
        }

        let ciphertext = match self {
            PaddingMode::ZeroPadding => {
                // Fresh stream per call: the filler depends only on the message length.
                let mut rng = ChaCha20Rng::from_seed(ZERO_SEED);
                key.encrypt(&mut rng, Pkcs1v15Encrypt, plaintext)?
            }
            PaddingMode::RandomPadding => {
                key.encrypt(&mut rand::thread_rng(), Pkcs1v15Encrypt, plaintext)?
            }
        };
        Ok(ciphertext)
    }
}

/// Decrypt one PKCS#1 v1.5 block with `key`.
///
/// # Errors
///
/// Returns [`TransformError::Rsa`] if the ciphertext length does not match the
/// modulus or the padding check fails (wrong key or tampered data).
pub fn decrypt(ciphertext: &[u8], key: &RsaPrivateKey) -> Result<Vec<u8>, TransformError> {
    Ok(key.decrypt(Pkcs1v15Encrypt, ciphertext)?)
}

/// Largest plaintext, in bytes, that fits in one block for `key`.
pub fn max_plaintext_len(key: &RsaPublicKey) -> usize {
    key.size().saturating_sub(PKCS1_OVERHEAD)
}

/// Encode ciphertext bytes as a record value (standard base64, padded, unwrapped).
pub fn encode_ciphertext(ciphertext: &[u8]) -> String {
    STANDARD.encode(ciphertext)
}

/// Decode a record value back into ciphertext bytes.
///
/// ASCII whitespace is ignored so that line-wrapped values decode.
///
/// # Errors
///
/// Returns [`TransformError::Base64`] if the value is not valid base64.
pub fn decode_ciphertext(value: &str) -> Result<Vec<u8>, TransformError> {
    let compact: String = value.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(STANDARD.decode(compact)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn zero_padding_is_deterministic() {
        let public = fixtures::public_key();
        let c1 = PaddingMode::ZeroPadding.encrypt(b"hello", &public).unwrap();
        let c2 = PaddingMode::ZeroPadding.encrypt(b"hello", &public).unwrap();
        assert_eq!(c1, c2);
        assert_eq!(c1.len(), 256);
    }

    #[test]
    fn random_padding_differs_per_call() {
        let public = fixtures::public_key();
        let c1 = PaddingMode::RandomPadding.encrypt(b"hello", &public).unwrap();
        let c2 = PaddingMode::RandomPadding.encrypt(b"hello", &public).unwrap();
        assert_ne!(c1, c2);
    }

    #[test]
    fn zero_and_random_padding_both_decrypt() {
        let public = fixtures::public_key();
        let private = fixtures::private_key();
        for mode in [PaddingMode::ZeroPadding, PaddingMode::RandomPadding] {
            let ciphertext = mode.encrypt(b"hello", &public).unwrap();
            assert_eq!(decrypt(&ciphertext, &private).unwrap(), b"hello");
        }
    }

    #[test]
    fn zero_padding_differs_for_different_plaintext() {
        let public = fixtures::public_key();
        let a = PaddingMode::ZeroPadding.encrypt(b"alice", &public).unwrap();
        let b = PaddingMode::ZeroPadding.encrypt(b"bob", &public).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn empty_plaintext_round_trips() {
        let public = fixtures::public_key();
        let private = fixtures::private_key();
        let ciphertext = PaddingMode::ZeroPadding.encrypt(b"", &public).unwrap();
        assert!(decrypt(&ciphertext, &private).unwrap().is_empty());
    }

    #[test]
    fn largest_plaintext_accepted_and_one_more_rejected() {
        let public = fixtures::public_key();
        let max = max_plaintext_len(&public);
        assert_eq!(max, 245);
        assert!(PaddingMode::ZeroPadding.encrypt(&vec![b'a'; max], &public).is_ok());
        let err = PaddingMode::RandomPadding
            .encrypt(&vec![b'a'; max + 1], &public)
            .unwrap_err();
        assert!(matches!(err, TransformError::PlaintextTooLong { len: 246, max: 245 }));
    }

    #[test]
    fn truncated_ciphertext_fails() {
        let public = fixtures::public_key();
        let private = fixtures::private_key();
        let ciphertext = PaddingMode::ZeroPadding.encrypt(b"hello", &public).unwrap();
        assert!(decrypt(&ciphertext[..100], &private).is_err());
    }

    #[test]
    fn tampered_ciphertext_fails_padding_check() {
        let public = fixtures::public_key();
        let private = fixtures::private_key();
        let mut ciphertext = PaddingMode::ZeroPadding.encrypt(b"hello", &public).unwrap();
        // Flip a byte to simulate tampering.
        ciphertext[10] ^= 0xFF;
        assert!(decrypt(&ciphertext, &private).is_err());
    }

    #[test]
    fn decode_ignores_line_breaks() {
        let encoded = encode_ciphertext(&[0xAB; 100]);
        let wrapped = format!("{}\n{}\n", &encoded[..76], &encoded[76..]);
        assert_eq!(decode_ciphertext(&wrapped).unwrap(), vec![0xAB; 100]);
    }

    #[test]
    fn decode_rejects_non_base64() {
        assert!(matches!(
            decode_ciphertext("not base64!"),
            Err(TransformError::Base64(_))
        ));
    }
}
