//! Decoding of [`KeyMaterial`] into a usable RSA [`KeyHandle`].

use std::fmt;

use common::{CryptError, OperationMode};
use pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{
    pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey},
    traits::PublicKeyParts,
    RsaPrivateKey, RsaPublicKey,
};
use serde::Deserialize;

use super::material::{KeyMaterial, PemLabel};

const LEGACY_ENCRYPTION_HINT: &str = "traditional OpenSSL-encrypted PEM is not supported; \
     convert it with `openssl pkcs8 -topk8 -v2 aes-256-cbc`";

/// Password for an encrypted private key, as returned by the credential store.
///
/// The buffer is overwritten with zeroes on drop and never printed.
#[derive(Clone, Deserialize)]
#[serde(from = "String")]
pub struct KeyPassword(Vec<u8>);

impl KeyPassword {
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into().into_bytes())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<String> for KeyPassword {
    fn from(password: String) -> Self {
        Self::new(password)
    }
}

impl Drop for KeyPassword {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl fmt::Debug for KeyPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyPassword([REDACTED])")
    }
}

/// A decoded RSA key, restricted to the one operation it can serve.
pub enum KeyHandle {
    /// Public key: encryption only.
    Public(RsaPublicKey),
    /// Private key: decryption only.
    Private(RsaPrivateKey),
}

impl KeyHandle {
    /// The operation this key can perform.
    pub fn mode(&self) -> OperationMode {
        match self {
            KeyHandle::Public(_) => OperationMode::Encrypt,
            KeyHandle::Private(_) => OperationMode::Decrypt,
        }
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        match self {
            KeyHandle::Public(key) => key.size() * 8,
            KeyHandle::Private(key) => key.size() * 8,
        }
    }
}

impl fmt::Debug for KeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyHandle::Public(_) => write!(f, "KeyHandle::Public({} bits)", self.bits()),
            // Never print private key material.
            KeyHandle::Private(_) => f.write_str("KeyHandle::Private([REDACTED])"),
        }
    }
}

/// Decode `material` into the key kind required by `mode`.
///
/// Encryption needs a public key (PKCS#1 or SPKI). Decryption needs a
/// private key (PKCS#1, PKCS#8, or encrypted PKCS#8 when `password` is
/// given). A password supplied for an unencrypted key is ignored.
///
/// # Errors
///
/// Returns [`CryptError::InvalidKeyMaterial`] naming the key file if the key
/// is the wrong kind for `mode`, is encrypted without a password, or cannot
/// be parsed or decrypted.
pub fn load(
    material: &KeyMaterial,
    mode: OperationMode,
    password: Option<&KeyPassword>,
) -> Result<KeyHandle, CryptError> {
    let result = match mode {
        OperationMode::Encrypt => load_public(material).map(KeyHandle::Public),
        OperationMode::Decrypt => load_private(material, password).map(KeyHandle::Private),
    };
    result.map_err(|reason| CryptError::InvalidKeyMaterial {
        key: material.source().to_owned(),
        mode,
        reason,
    })
}

fn load_public(material: &KeyMaterial) -> Result<RsaPublicKey, String> {
    if !material.label().is_public() {
        return Err("a private key cannot be used for encryption; provide the public key".into());
    }
    let pem = material.pem();
    match material.label() {
        PemLabel::RsaPublicKey => RsaPublicKey::from_pkcs1_pem(pem).map_err(|e| e.to_string()),
        _ => RsaPublicKey::from_public_key_pem(pem).map_err(|e| e.to_string()),
    }
}

fn load_private(material: &KeyMaterial, password: Option<&KeyPassword>) -> Result<RsaPrivateKey, String> {
    if material.is_legacy_encrypted() {
        return Err(LEGACY_ENCRYPTION_HINT.into());
    }

    let pem = material.pem();
    match (material.label(), password) {
        (PemLabel::RsaPrivateKey, _) => {
            RsaPrivateKey::from_pkcs1_pem(pem).map_err(|e| e.to_string())
        }
        (PemLabel::PrivateKey, _) => RsaPrivateKey::from_pkcs8_pem(pem).map_err(|e| e.to_string()),
        (PemLabel::EncryptedPrivateKey, Some(password)) => {
            RsaPrivateKey::from_pkcs8_encrypted_pem(pem, password.as_bytes())
                .map_err(|e| format!("cannot decrypt private key: {e}"))
        }
        (PemLabel::EncryptedPrivateKey, None) => Err(
            "private key is encrypted; set keyencryption=true and store its password".into(),
        ),
        (PemLabel::RsaPublicKey | PemLabel::PublicKey, _) => {
            Err("a public key cannot be used for decryption; provide the private key".into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn material(pem: &str) -> KeyMaterial {
        KeyMaterial::detect("lib/keys/test.pem", pem.as_bytes().to_vec()).unwrap()
    }

    fn password() -> KeyPassword {
        KeyPassword::new(fixtures::PASSWORD)
    }

    #[test]
    fn loads_public_keys_for_encryption() {
        for pem in [fixtures::PUBLIC_PKCS1, fixtures::PUBLIC_SPKI] {
            let handle = load(&material(pem), OperationMode::Encrypt, None).unwrap();
            assert_eq!(handle.mode(), OperationMode::Encrypt);
            assert_eq!(handle.bits(), 2048);
        }
    }

    #[test]
    fn loads_unencrypted_private_keys_for_decryption() {
        for pem in [fixtures::PRIVATE_PKCS1, fixtures::PRIVATE_PKCS8] {
            let handle = load(&material(pem), OperationMode::Decrypt, None).unwrap();
            assert_eq!(handle.mode(), OperationMode::Decrypt);
        }
    }

    #[test]
    fn password_is_ignored_for_unencrypted_private_key() {
        let pw = password();
        let handle = load(&material(fixtures::PRIVATE_PKCS8), OperationMode::Decrypt, Some(&pw));
        assert!(handle.is_ok());
    }

    #[test]
    fn loads_encrypted_private_keys_with_password() {
        let pw = password();
        for pem in [fixtures::PRIVATE_AES256, fixtures::PRIVATE_DES3, fixtures::PRIVATE_DES] {
            let handle = load(&material(pem), OperationMode::Decrypt, Some(&pw)).unwrap();
            assert_eq!(handle.bits(), 2048);
        }
    }

    #[test]
    fn wrong_password_is_invalid_key_material() {
        let pw = KeyPassword::new("battery-staple");
        let err = load(&material(fixtures::PRIVATE_AES256), OperationMode::Decrypt, Some(&pw))
            .unwrap_err();
        assert!(matches!(err, CryptError::InvalidKeyMaterial { .. }));
    }

    #[test]
    fn encrypted_key_without_password_is_rejected() {
        let err = load(&material(fixtures::PRIVATE_AES256), OperationMode::Decrypt, None).unwrap_err();
        match err {
            CryptError::InvalidKeyMaterial { reason, .. } => assert!(reason.contains("keyencryption")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn legacy_encrypted_key_is_rejected_with_hint() {
        let pw = password();
        let err = load(
            &material(fixtures::PRIVATE_LEGACY_ENCRYPTED),
            OperationMode::Decrypt,
            Some(&pw),
        )
        .unwrap_err();
        match err {
            CryptError::InvalidKeyMaterial { reason, .. } => assert!(reason.contains("pkcs8")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn mismatched_key_kind_is_invalid_key_material() {
        let err = load(&material(fixtures::PRIVATE_PKCS1), OperationMode::Encrypt, None).unwrap_err();
        assert!(matches!(
            err,
            CryptError::InvalidKeyMaterial { ref key, mode: OperationMode::Encrypt, .. }
                if key == "lib/keys/test.pem"
        ));

        let err = load(&material(fixtures::PUBLIC_PKCS1), OperationMode::Decrypt, None).unwrap_err();
        assert!(matches!(
            err,
            CryptError::InvalidKeyMaterial { mode: OperationMode::Decrypt, .. }
        ));
    }

    #[test]
    fn loads_keys_with_leading_whitespace() {
        let public = format!("\n  {}", fixtures::PUBLIC_SPKI);
        let handle = load(&material(&public), OperationMode::Encrypt, None).unwrap();
        assert_eq!(handle.bits(), 2048);

        let private = format!("\r\n\t{}", fixtures::PRIVATE_AES256);
        let pw = password();
        let handle = load(&material(&private), OperationMode::Decrypt, Some(&pw)).unwrap();
        assert_eq!(handle.mode(), OperationMode::Decrypt);
    }

    #[test]
    fn corrupt_body_is_invalid_key_material() {
        let pem = "-----BEGIN RSA PUBLIC KEY-----\nAAAA\n-----END RSA PUBLIC KEY-----\n";
        let err = load(&material(pem), OperationMode::Encrypt, None).unwrap_err();
        assert!(matches!(err, CryptError::InvalidKeyMaterial { .. }));
    }

    #[test]
    fn secrets_redacted_in_debug() {
        let handle = load(&material(fixtures::PRIVATE_PKCS1), OperationMode::Decrypt, None).unwrap();
        assert!(format!("{handle:?}").contains("REDACTED"));
        assert_eq!(format!("{:?}", password()), "KeyPassword([REDACTED])");
    }
}
