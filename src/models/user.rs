//! User account record
//!
//! Stores a username, its argon2 password hash and the role granted at login.

use serde::{Deserialize, Serialize};

use crate::auth::{hash_password, verify_password, Role};
use crate::types::Result;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UserAccount {
    /// Unique username
    pub username: String,

    /// Argon2 password hash (PHC format)
    pub password_hash: String,

    /// Role embedded in issued tokens
    pub role: Role,
}

impl UserAccount {
    /// Create a new account, hashing the plaintext password
    pub fn new(username: impl Into<String>, password: &str, role: Role) -> Result<Self> {
        Ok(Self {
            username: username.into(),
            password_hash: hash_password(password)?,
            role,
        })
    }

    /// Check a plaintext password against the stored hash.
    /// A malformed stored hash counts as a mismatch.
    pub fn is_correct_password(&self, password: &str) -> bool {
        verify_password(password, &self.password_hash).unwrap_or(false)
    }
}
