//! [`KeyMaterial`]: raw key file bytes plus the detected PEM format.

use std::fmt;

use bytes::Bytes;
use common::CryptError;
use sha2::{Digest, Sha256};

/// Header line that marks a traditional OpenSSL-encrypted PEM body.
const LEGACY_ENCRYPTION_HEADER: &str = "Proc-Type: 4,ENCRYPTED";

/// The PEM label found on the first encapsulation boundary of a key file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PemLabel {
    /// `RSA PUBLIC KEY` (PKCS#1).
    RsaPublicKey,
    /// `PUBLIC KEY` (SubjectPublicKeyInfo).
    PublicKey,
    /// `RSA PRIVATE KEY` (PKCS#1).
    RsaPrivateKey,
    /// `PRIVATE KEY` (unencrypted PKCS#8).
    PrivateKey,
    /// `ENCRYPTED PRIVATE KEY` (PBES2-encrypted PKCS#8).
    EncryptedPrivateKey,
}

impl PemLabel {
    fn from_label(label: &str) -> Option<Self> {
        match label {
            "RSA PUBLIC KEY" => Some(PemLabel::RsaPublicKey),
            "PUBLIC KEY" => Some(PemLabel::PublicKey),
            "RSA PRIVATE KEY" => Some(PemLabel::RsaPrivateKey),
            "PRIVATE KEY" => Some(PemLabel::PrivateKey),
            "ENCRYPTED PRIVATE KEY" => Some(PemLabel::EncryptedPrivateKey),
            _ => None,
        }
    }

    /// Returns `true` for public key labels.
    pub fn is_public(self) -> bool {
        matches!(self, PemLabel::RsaPublicKey | PemLabel::PublicKey)
    }
}

/// Content of one key file, validated to be PEM.
///
/// Owned by the pipeline for the duration of one invocation.
#[derive(Clone)]
pub struct KeyMaterial {
    source: String,
    content: Bytes,
    label: PemLabel,
    legacy_encrypted: bool,
}

impl KeyMaterial {
    /// Check that `content` is a PEM-encoded RSA key and record its label.
    ///
    /// `source` is the key file identity as configured; it names the key in
    /// errors and is the realm used for password lookup.
    ///
    /// # Errors
    ///
    /// Returns [`CryptError::UnsupportedKeyFormat`] if `content` is not UTF-8
    /// or does not open with a public or private key PEM boundary.
    pub fn detect(source: impl Into<String>, content: impl Into<Bytes>) -> Result<Self, CryptError> {
        let source = source.into();
        let content = content.into();

        let label = std::str::from_utf8(&content)
            .ok()
            .and_then(begin_label)
            .and_then(PemLabel::from_label)
            .ok_or_else(|| CryptError::UnsupportedKeyFormat {
                key: source.clone(),
            })?;

        let legacy_encrypted = std::str::from_utf8(&content)
            .map(|text| text.contains(LEGACY_ENCRYPTION_HEADER))
            .unwrap_or(false);

        Ok(Self {
            source,
            content,
            label,
            legacy_encrypted,
        })
    }

    /// Key file identity as configured.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn label(&self) -> PemLabel {
        self.label
    }

    /// Returns `true` if the body uses traditional `Proc-Type` encryption.
    pub fn is_legacy_encrypted(&self) -> bool {
        self.legacy_encrypted
    }

    /// PEM text from the `BEGIN` boundary on; leading whitespace is dropped
    /// so the decoder sees the same boundary [`KeyMaterial::detect`] matched.
    pub fn pem(&self) -> &str {
        std::str::from_utf8(&self.content)
            .unwrap_or_default()
            .trim_start()
    }

    /// Short SHA-256 fingerprint of the key bytes, safe to log.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(&self.content);
        digest[..8].iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key bytes.
        f.debug_struct("KeyMaterial")
            .field("source", &self.source)
            .field("label", &self.label)
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

/// Extract `<label>` from a leading `-----BEGIN <label>-----` line.
fn begin_label(text: &str) -> Option<&str> {
    let first = text.trim_start().lines().next()?.trim_end();
    first.strip_prefix("-----BEGIN ")?.strip_suffix("-----")
}
