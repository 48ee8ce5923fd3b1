//! Common types, record protocol, and errors shared across `crypt` crates.

pub mod error;
pub mod protocol;

pub use error::CryptError;
pub use protocol::{FieldWarning, OperationMode, Record};
