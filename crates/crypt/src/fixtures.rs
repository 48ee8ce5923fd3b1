//! Test key material shared by unit tests.
//!
//! All fixtures belong to one 2048-bit RSA key pair generated with OpenSSL:
//!
//! ```text
//! openssl genrsa -traditional -out private_pkcs1.pem 2048
//! openssl pkcs8 -topk8 -nocrypt -in private_pkcs1.pem -out private_pkcs8.pem
//! openssl rsa -in private_pkcs1.pem -RSAPublicKey_out -out public_pkcs1.pem
//! openssl rsa -in private_pkcs1.pem -pubout -out public_spki.pem
//! openssl pkcs8 -topk8 -v2 <aes-256-cbc|des3|des-cbc> -passout pass:correct-horse ...
//! openssl rsa -in private_pkcs1.pem -aes256 -traditional ... -out private_legacy_encrypted.pem
//! ```

use rsa::{pkcs1::DecodeRsaPrivateKey, pkcs1::DecodeRsaPublicKey, RsaPrivateKey, RsaPublicKey};

pub const PUBLIC_PKCS1: &str = include_str!("../testdata/public_pkcs1.pem");
pub const PUBLIC_SPKI: &str = include_str!("../testdata/public_spki.pem");
pub const PRIVATE_PKCS1: &str = include_str!("../testdata/private_pkcs1.pem");
pub const PRIVATE_PKCS8: &str = include_str!("../testdata/private_pkcs8.pem");
pub const PRIVATE_AES256: &str = include_str!("../testdata/private_aes256.pem");
pub const PRIVATE_DES3: &str = include_str!("../testdata/private_des3.pem");
pub const PRIVATE_DES: &str = include_str!("../testdata/private_des.pem");
pub const PRIVATE_LEGACY_ENCRYPTED: &str = include_str!("../testdata/private_legacy_encrypted.pem");

/// Password protecting every encrypted private key fixture.
pub const PASSWORD: &str = "correct-horse";

pub fn public_key() -> RsaPublicKey {
    RsaPublicKey::from_pkcs1_pem(PUBLIC_PKCS1).expect("public key fixture")
}

pub fn private_key() -> RsaPrivateKey {
    RsaPrivateKey::from_pkcs1_pem(PRIVATE_PKCS1).expect("private key fixture")
}
