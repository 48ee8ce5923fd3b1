//! RSA field encryption primitives.
//!
//! Padding strategies, the single decryption primitive, and the base64 codec
//! used at the record boundary. No configuration or I/O happens here.
//!
//! # Field value format
//!
//! ```text
//! base64-standard(rsa-pkcs1v15(plaintext))
//! ```
//!
//! One RSA block per field; the plaintext limit is the modulus size minus
//! [`cipher::PKCS1_OVERHEAD`] bytes.

pub mod cipher;

pub use cipher::{PaddingMode, TransformError};
