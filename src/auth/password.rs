//! Account password hashes
//!
//! `UserAccount` stores only the PHC string produced here (argon2id, default
//! parameters, random salt). Login compares a submitted password against it
//! and never sees the plaintext again.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::types::CatalogError;

/// Hash a new account's password
pub fn hash_password(password: &str) -> Result<String, CatalogError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CatalogError::Auth(format!("cannot hash password: {e}")))
}

/// Check a login attempt against an account's stored hash.
///
/// A wrong password is `Ok(false)`; only an unparseable hash is an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, CatalogError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| CatalogError::Auth(format!("invalid password hash format: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
