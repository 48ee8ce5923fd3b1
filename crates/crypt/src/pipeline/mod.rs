//! The field cipher: preparation gates and per-record field transforms.
//!
//! # Lifecycle
//!
//! 1. [`FieldCipher::prepare`] runs every fatal check once, in order: key
//!    format, operation mode, authorization, password lookup (encrypted
//!    private keys only), key load. Any failure returns a
//!    [`CryptError`] before a single record has been read.
//! 2. [`FieldCipher::process`] wraps an upstream record iterator and yields
//!    one transformed record per input record, in order.
//!
//! # Module invariants
//!
//! - Per-field failures never abort the stream: the field keeps its
//!   original value and a [`FieldWarning`] is produced.
//! - Fields whose name starts with `_` are never transformed.

pub mod stream;

pub use stream::{Processed, StreamSummary};

use bytes::Bytes;
use common::protocol::is_internal_field;
use common::{CryptError, FieldWarning, OperationMode, Record};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde_json::Value;
use tracing::{debug, info};

use crate::authz::{self, Capability, IdentityProvider};
use crate::config::Config;
use crate::credentials::CredentialStore;
use crate::crypto::{cipher, PaddingMode, TransformError};
use crate::keys::{self, KeyHandle, KeyMaterial};

/// Invocation settings consumed by [`FieldCipher::prepare`].
#[derive(Debug, Clone)]
pub struct Settings {
    /// Raw mode value; parsed during preparation.
    pub mode: String,
    pub key_encryption: bool,
    pub random_padding: bool,
    pub fields: Vec<String>,
    pub principal: String,
}

impl From<&Config> for Settings {
    fn from(cfg: &Config) -> Self {
        Self {
            mode: cfg.mode.clone(),
            key_encryption: cfg.keyencryption,
            random_padding: cfg.randpadding,
            fields: cfg.fields.clone(),
            principal: cfg.principal.clone(),
        }
    }
}

/// Transform applied to every selected field.
enum FieldTransform {
    Encrypt {
        key: RsaPublicKey,
        padding: PaddingMode,
    },
    Decrypt {
        key: RsaPrivateKey,
    },
}

impl FieldTransform {
    fn new(handle: KeyHandle, padding: PaddingMode) -> Self {
        match handle {
            KeyHandle::Public(key) => FieldTransform::Encrypt { key, padding },
            KeyHandle::Private(key) => FieldTransform::Decrypt { key },
        }
    }

    fn apply(&self, value: &str) -> Result<String, TransformError> {
        match self {
            FieldTransform::Encrypt { key, padding } => {
                let ciphertext = padding.encrypt(value.as_bytes(), key)?;
                Ok(cipher::encode_ciphertext(&ciphertext))
            }
            FieldTransform::Decrypt { key } => {
                let ciphertext = cipher::decode_ciphertext(value)?;
                let plaintext = cipher::decrypt(&ciphertext, key)?;
                String::from_utf8(plaintext).map_err(|_| TransformError::NotUtf8)
            }
        }
    }
}

/// Result of transforming one record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordOutcome {
    pub record: Record,
    /// Number of fields replaced with a transformed value.
    pub transformed: usize,
    pub warnings: Vec<FieldWarning>,
}

/// A prepared, authorized cipher bound to one key for one record stream.
pub struct FieldCipher {
    mode: OperationMode,
    transform: FieldTransform,
    fields: Vec<String>,
}

impl FieldCipher {
    /// Run all fatal checks and load the key.
    ///
    /// `key_source` is the key file identity as configured and `key_bytes`
    /// its content. The identity provider is consulted once; the credential
    /// store at most once, and never for an unauthorized principal.
    ///
    /// # Errors
    ///
    /// Returns the first failing check as [`CryptError::UnsupportedKeyFormat`],
    /// [`CryptError::InvalidMode`], [`CryptError::NotAuthorized`],
    /// [`CryptError::MissingKeyPassword`], [`CryptError::InvalidKeyMaterial`],
    /// or [`CryptError::Unavailable`] from a collaborator.
    pub fn prepare(
        settings: &Settings,
        key_source: &str,
        key_bytes: Bytes,
        identities: &dyn IdentityProvider,
        credentials: &dyn CredentialStore,
    ) -> Result<Self, CryptError> {
        let material = KeyMaterial::detect(key_source, key_bytes)?;
        let mode: OperationMode = settings.mode.parse()?;

        let identity = identities.identity(&settings.principal)?;
        debug!(
            principal = identity.principal(),
            roles = identity.roles().len(),
            can_encrypt = identity.has_capability(Capability::Encrypt),
            can_decrypt = identity.has_capability(Capability::Decrypt),
            "identity resolved"
        );
        let decision = authz::authorize(&identity, mode);
        decision.ensure_granted()?;
        info!(
            principal = %decision.principal,
            mode = %mode,
            role = decision.granted_by.as_deref().unwrap_or_default(),
            "principal authorized"
        );

        let password = match mode {
            OperationMode::Decrypt if settings.key_encryption => Some(
                credentials
                    .password(material.source(), &settings.principal)?
                    .ok_or_else(|| CryptError::MissingKeyPassword {
                        key: material.source().to_owned(),
                        principal: settings.principal.clone(),
                    })?,
            ),
            OperationMode::Decrypt => None,
            OperationMode::Encrypt => {
                if settings.key_encryption {
                    debug!("keyencryption has no effect when encrypting");
                }
                None
            }
        };

        let handle = keys::load(&material, mode, password.as_ref())?;
        info!(
            key = %material.source(),
            fingerprint = %material.fingerprint(),
            bits = handle.bits(),
            usage = %handle.mode(),
            "key loaded"
        );

        let padding = PaddingMode::from_random_flag(settings.random_padding);
        if mode == OperationMode::Decrypt && settings.random_padding {
            debug!("randpadding has no effect when decrypting");
        }

        Ok(Self {
            mode,
            transform: FieldTransform::new(handle, padding),
            fields: dedup_fields(&settings.fields),
        })
    }

    pub fn mode(&self) -> OperationMode {
        self.mode
    }

    /// Selected field names, in configuration order without duplicates.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Transform the selected fields of one record.
    ///
    /// Absent fields and internal fields are skipped. A field that fails to
    /// transform keeps its original value and yields a [`FieldWarning`].
    pub fn transform_record(&self, mut record: Record) -> RecordOutcome {
        let mut transformed = 0;
        let mut warnings = Vec::new();

        for field in &self.fields {
            if is_internal_field(field) {
                continue;
            }
            let outcome = match record.get(field) {
                None => continue,
                Some(Value::String(text)) => {
                    self.transform.apply(text).map_err(|e| (text.clone(), e))
                }
                Some(other) => Err((other.to_string(), TransformError::NotText)),
            };
            match outcome {
                Ok(value) => {
                    record.insert(field.as_str(), value);
                    transformed += 1;
                }
                Err((original, e)) => warnings.push(FieldWarning {
                    field: field.clone(),
                    original,
                    reason: e.to_string(),
                }),
            }
        }

        RecordOutcome {
            record,
            transformed,
            warnings,
        }
    }

    /// Lazily transform `records`, one record in flight at a time.
    pub fn process<I>(&self, records: I) -> Processed<'_, I::IntoIter>
    where
        I: IntoIterator<Item = Record>,
    {
        Processed::new(self, records.into_iter())
    }
}

fn dedup_fields(fields: &[String]) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(fields.len());
    for field in fields {
        if !unique.contains(field) {
            unique.push(field.clone());
        }
    }
    unique
}
