//! [`FileCredentialStore`]: key passwords loaded from a YAML or JSON file.
//!
//! ```yaml
//! passwords:
//!   - realm: lib/keys/private.pem
//!     username: alice
//!     password: correct-horse
//! ```

use std::path::Path;

use common::CryptError;
use serde::Deserialize;
use tracing::debug;

use super::CredentialStore;
use crate::keys::KeyPassword;

const SOURCE_NAME: &str = "credential store";

#[derive(Debug, Deserialize)]
struct StoredPassword {
    realm: String,
    username: String,
    password: KeyPassword,
}

#[derive(Deserialize)]
struct StoreDocument {
    #[serde(default)]
    passwords: Vec<StoredPassword>,
}

/// In-memory copy of the password file, read once at startup.
#[derive(Debug)]
pub struct FileCredentialStore {
    entries: Vec<StoredPassword>,
}

impl FileCredentialStore {
    /// Read and parse a password file.
    ///
    /// # Errors
    ///
    /// Returns [`CryptError::Unavailable`] if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CryptError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| unavailable(format!("cannot read {}: {e}", path.display())))?;
        let store = Self::parse(&text)
            .map_err(|reason| unavailable(format!("cannot parse {}: {reason}", path.display())))?;
        debug!(path = %path.display(), entries = store.entries.len(), "credential store loaded");
        Ok(store)
    }

    /// Parse a password document as YAML, falling back to JSON.
    pub fn parse(text: &str) -> Result<Self, String> {
        let document: StoreDocument = if let Ok(parsed) = serde_yaml::from_str(text) {
            parsed
        } else {
            serde_json::from_str(text).map_err(|e| format!("not valid YAML or JSON: {e}"))?
        };
        Ok(Self {
            entries: document.passwords,
        })
    }
}

impl CredentialStore for FileCredentialStore {
    fn password(&self, realm: &str, principal: &str) -> Result<Option<KeyPassword>, CryptError> {
        Ok(self
            .entries
            .iter()
            .find(|entry| entry.realm == realm && entry.username == principal)
            .map(|entry| entry.password.clone()))
    }
}

fn unavailable(reason: String) -> CryptError {
    CryptError::Unavailable {
        source_name: SOURCE_NAME.into(),
        reason,
    }
}
