//! Lookup of passwords protecting encrypted private key files.
//!
//! Passwords are stored per key file and per user: the *realm* is the key
//! file identity exactly as configured (e.g. `lib/keys/private.pem`) and the
//! *username* is the invoking principal. The pipeline performs at most one
//! lookup per invocation, and only after authorization has passed.

pub mod store;

pub use store::FileCredentialStore;

use common::CryptError;

use crate::keys::KeyPassword;

/// Source of stored key passwords (the host's secret store).
#[cfg_attr(test, mockall::automock)]
pub trait CredentialStore {
    /// Return the password stored for `realm` and `principal`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`CryptError::Unavailable`] if the backing store cannot be read.
    fn password(&self, realm: &str, principal: &str) -> Result<Option<KeyPassword>, CryptError>;
}

/// Store used when no credentials file is configured: holds nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialStore for NoCredentials {
    fn password(&self, _realm: &str, _principal: &str) -> Result<Option<KeyPassword>, CryptError> {
        Ok(None)
    }
}
