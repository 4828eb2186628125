//! Password hashing for user provisioning.
//!
//! Blueprint passwords may arrive either plaintext or already crypted.
//! Crypted values pass through untouched; plaintext is hashed with SHA-512
//! crypt before it is embedded in any stage record, so plaintext never
//! reaches the manifest.

use sha_crypt::{sha512_simple, Sha512Params};

use crate::error::{Result, StageError};

/// Modular-crypt prefixes accepted as already-hashed passwords.
/// SHA-512, SHA-256 and bcrypt respectively.
const CRYPTED_PREFIXES: &[&str] = &["$6$", "$5$", "$2b$"];

/// Whether a password string is already in crypted form.
pub fn password_is_crypted(password: &str) -> bool {
    CRYPTED_PREFIXES
        .iter()
        .any(|prefix| password.starts_with(prefix))
}

/// Hash a plaintext password into a `$6$` SHA-512 crypt string.
///
/// The salt is generated per call, so hashing the same password twice yields
/// different (equally valid) strings.
pub fn crypt_sha512(user: &str, password: &str) -> Result<String> {
    let params = Sha512Params::default();
    sha512_simple(password, &params).map_err(|_| StageError::PasswordHash { user: user.into() })
}
