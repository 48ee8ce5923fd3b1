//! [`RoleDirectory`]: file-backed [`IdentityProvider`].
//!
//! The directory is a YAML (or JSON) document listing users with their
//! assigned roles, and roles with the roles they import:
//!
//! ```yaml
//! users:
//!   alice:
//!     roles: [analyst]
//! roles:
//!   analyst:
//!     imported_roles: [user, can_decrypt]
//! ```
//!
//! A user role that has no entry under `roles` imports nothing.

use std::collections::HashMap;
use std::path::Path;

use common::CryptError;
use serde::Deserialize;
use tracing::debug;

use super::{Identity, IdentityProvider, RoleGrant};

const SOURCE_NAME: &str = "identity directory";

#[derive(Debug, Clone, Default, Deserialize)]
struct UserEntry {
    #[serde(default)]
    roles: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RoleEntry {
    #[serde(default)]
    imported_roles: Vec<String>,
}

/// Users, their roles, and role imports, loaded once per invocation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleDirectory {
    #[serde(default)]
    users: HashMap<String, UserEntry>,
    #[serde(default)]
    roles: HashMap<String, RoleEntry>,
}

impl RoleDirectory {
    /// Read and parse a directory file.
    ///
    /// # Errors
    ///
    /// Returns [`CryptError::Unavailable`] if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CryptError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| unavailable(format!(
            "cannot read {}: {e}",
            path.display()
        )))?;
        let directory = Self::parse(&text)
            .map_err(|reason| unavailable(format!("cannot parse {}: {reason}", path.display())))?;
        debug!(
            path = %path.display(),
            users = directory.users.len(),
            roles = directory.roles.len(),
            "identity directory loaded"
        );
        Ok(directory)
    }

    /// Parse a directory document as YAML, falling back to JSON.
    pub fn parse(text: &str) -> Result<Self, String> {
        if let Ok(parsed) = serde_yaml::from_str(text) {
            Ok(parsed)
        } else {
            serde_json::from_str(text).map_err(|e| format!("not valid YAML or JSON: {e}"))
        }
    }
}

impl IdentityProvider for RoleDirectory {
    fn identity(&self, principal: &str) -> Result<Identity, CryptError> {
        let Some(user) = self.users.get(principal) else {
            debug!(principal, "principal not found in identity directory");
            return Ok(Identity::without_roles(principal));
        };

        let roles = user
            .roles
            .iter()
            .map(|name| {
                let imported = self
                    .roles
                    .get(name)
                    .map(|role| role.imported_roles.clone())
                    .unwrap_or_default();
                RoleGrant::new(name.as_str(), imported)
            })
            .collect();

        Ok(Identity::new(principal, roles))
    }
}

fn unavailable(reason: String) -> CryptError {
    CryptError::Unavailable {
        source_name: SOURCE_NAME.into(),
        reason,
    }
}
