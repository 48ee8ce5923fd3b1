//! Key file validation and RSA key loading.
//!
//! # Lifecycle
//!
//! 1. The driver reads the configured key file once; [`KeyMaterial::detect`]
//!    rejects anything that is not a PEM-encoded RSA key before any
//!    cryptographic parsing is attempted.
//! 2. For encrypted private keys the pipeline fetches a [`KeyPassword`] from
//!    the credential store.
//! 3. [`load`] decodes the material into a [`KeyHandle`] whose kind matches
//!    the operation mode. The handle lives for one record stream.
//!
//! # Security invariants
//!
//! - Key bytes, private keys and passwords are never logged; `Debug` output
//!   is redacted and only [`KeyMaterial::fingerprint`] may appear in logs.
//! - Supported private-key encryption: PBES2 with AES-256-CBC, DES-EDE3-CBC
//!   or DES-CBC.

pub mod loader;
pub mod material;

pub use loader::{load, KeyHandle, KeyPassword};
pub use material::KeyMaterial;
