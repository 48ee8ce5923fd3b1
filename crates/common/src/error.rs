//! Common error types shared across crates.

use thiserror::Error;

use crate::protocol::OperationMode;

/// Fatal error that aborts an invocation before any record is emitted.
///
/// Variants map to process exit codes (sysexits-style) returned to callers:
/// - [`CryptError::InvalidMode`] → 64
/// - [`CryptError::UnsupportedKeyFormat`], [`CryptError::InvalidKeyMaterial`] → 65
/// - [`CryptError::Unavailable`] → 69
/// - [`CryptError::MissingKeyPassword`], [`CryptError::NotAuthorized`] → 77
#[derive(Debug, Error)]
pub enum CryptError {
    /// The key file does not carry a PEM header for an RSA public or private key.
    #[error("unsupported key format in {key}: only PEM-encoded RSA keys are supported")]
    UnsupportedKeyFormat { key: String },

    /// The key file is PEM but cannot be used for the requested operation.
    #[error("invalid key file provided for {mode}: {key} ({reason}); check 'key' and 'keyencryption'")]
    InvalidKeyMaterial {
        key: String,
        mode: OperationMode,
        reason: String,
    },

    /// `keyencryption` is set but the credential store holds no password for
    /// this key file and principal.
    #[error("no password associated with key file {key} has been found for user '{principal}'")]
    MissingKeyPassword { key: String, principal: String },

    /// The configured mode is neither encrypt nor decrypt.
    #[error("invalid mode has been set: '{0}'")]
    InvalidMode(String),

    /// The invoking principal holds no role granting the requested operation.
    #[error("user '{principal}' is not authorized to perform {mode} operations")]
    NotAuthorized {
        principal: String,
        mode: OperationMode,
    },

    /// A host collaborator (identity directory, credential store) could not be read.
    #[error("{source_name} unavailable: {reason}")]
    Unavailable { source_name: String, reason: String },
}

impl CryptError {
    /// Returns the process exit code that should be used for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CryptError::InvalidMode(_) => 64,
            CryptError::UnsupportedKeyFormat { .. } | CryptError::InvalidKeyMaterial { .. } => 65,
            CryptError::Unavailable { .. } => 69,
            CryptError::MissingKeyPassword { .. } | CryptError::NotAuthorized { .. } => 77,
        }
    }
}
