//! Role-based authorization of the invoking principal.
//!
//! A principal is granted an operation when one of its roles, or one role
//! imported by such a role, carries the operation's capability token. The
//! role graph is flattened once into a capability set when the [`Identity`]
//! is built; [`authorize`] only reads that set.
//!
//! # Matching rule
//!
//! A role name carries a token when it *contains* it (case-sensitive
//! substring). `team_can_encrypt_eu` therefore grants encryption. Imports are
//! followed one level: roles imported by an imported role are not considered.

pub mod directory;

pub use directory::RoleDirectory;

use std::collections::BTreeMap;

use common::{CryptError, OperationMode};
use serde::Deserialize;

/// An operation a role can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    Encrypt,
    Decrypt,
}

impl Capability {
    pub const ALL: [Capability; 2] = [Capability::Encrypt, Capability::Decrypt];

    /// Token a role name must contain to grant this capability.
    pub fn token(self) -> &'static str {
        match self {
            Capability::Encrypt => "can_encrypt",
            Capability::Decrypt => "can_decrypt",
        }
    }
}

impl From<OperationMode> for Capability {
    fn from(mode: OperationMode) -> Self {
        match mode {
            OperationMode::Encrypt => Capability::Encrypt,
            OperationMode::Decrypt => Capability::Decrypt,
        }
    }
}

/// A role assigned to a principal, with the roles it imports.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoleGrant {
    pub name: String,
    #[serde(default)]
    pub imported_roles: Vec<String>,
}

impl RoleGrant {
    pub fn new(name: impl Into<String>, imported_roles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            imported_roles: imported_roles.into_iter().map(Into::into).collect(),
        }
    }
}

/// The invoking principal and its effective capabilities.
#[derive(Debug, Clone)]
pub struct Identity {
    principal: String,
    roles: Vec<RoleGrant>,
    /// Capability → first role name (direct or imported) that grants it.
    grants: BTreeMap<Capability, String>,
}

impl Identity {
    /// Build an identity, flattening direct and imported roles into capabilities.
    pub fn new(principal: impl Into<String>, roles: Vec<RoleGrant>) -> Self {
        let mut grants = BTreeMap::new();
        for role in &roles {
            let names = std::iter::once(&role.name).chain(&role.imported_roles);
            for name in names {
                for capability in Capability::ALL {
                    if name.contains(capability.token()) {
                        grants.entry(capability).or_insert_with(|| name.clone());
                    }
                }
            }
        }
        Self {
            principal: principal.into(),
            roles,
            grants,
        }
    }

    /// An identity with no roles; it is denied every operation.
    pub fn without_roles(principal: impl Into<String>) -> Self {
        Self::new(principal, Vec::new())
    }

    pub fn principal(&self) -> &str {
        &self.principal
    }

    pub fn roles(&self) -> &[RoleGrant] {
        &self.roles
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.grants.contains_key(&capability)
    }

    /// Name of the role that grants `capability`, if any.
    pub fn granting_role(&self, capability: Capability) -> Option<&str> {
        self.grants.get(&capability).map(String::as_str)
    }
}

/// Outcome of evaluating an [`Identity`] against an [`OperationMode`].
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationDecision {
    pub principal: String,
    pub mode: OperationMode,
    /// Role that granted the operation; `None` means denied.
    pub granted_by: Option<String>,
}

impl AuthorizationDecision {
    pub fn is_granted(&self) -> bool {
        self.granted_by.is_some()
    }

    /// Convert a denial into [`CryptError::NotAuthorized`].
    pub fn ensure_granted(&self) -> Result<(), CryptError> {
        if self.is_granted() {
            Ok(())
        } else {
            Err(CryptError::NotAuthorized {
                principal: self.principal.clone(),
                mode: self.mode,
            })
        }
    }
}

/// Decide whether `identity` may perform `mode`.
pub fn authorize(identity: &Identity, mode: OperationMode) -> AuthorizationDecision {
    AuthorizationDecision {
        principal: identity.principal().to_owned(),
        mode,
        granted_by: identity.granting_role(mode.into()).map(str::to_owned),
    }
}

/// Source of identities for principals (the host's authorization subsystem).
#[cfg_attr(test, mockall::automock)]
pub trait IdentityProvider {
    /// Resolve the roles assigned to `principal`.
    ///
    /// Unknown principals resolve to an identity without roles.
    ///
    /// # Errors
    ///
    /// Returns [`CryptError::Unavailable`] if the backing source cannot be read.
    fn identity(&self, principal: &str) -> Result<Identity, CryptError>;
}
