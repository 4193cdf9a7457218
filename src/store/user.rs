//! User registry
//!
//! Append-only: accounts are created once and never updated or deleted.

use tracing::info;

use super::memory::MemoryStore;
use crate::auth::Role;
use crate::models::UserAccount;
use crate::types::{CatalogError, Result};

#[derive(Default)]
pub struct UserStore {
    users: MemoryStore<String, UserAccount>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a copy of `user`. Fails with `AlreadyExists` on a taken username.
    pub async fn save(&self, user: &UserAccount) -> Result<()> {
        self.users
            .insert(user.username.clone(), user)
            .await
            .map_err(|_| CatalogError::AlreadyExists(user.username.clone()))
    }

    pub async fn find(&self, username: &str) -> Option<UserAccount> {
        self.users.get(&username.to_string()).await
    }

    /// Hash `password` and register a new account
    pub async fn create(&self, username: &str, password: &str, role: Role) -> Result<()> {
        let user = UserAccount::new(username, password, role)?;
        self.save(&user).await?;
        info!(username, role = %role, "Created user");
        Ok(())
    }
}

/// Default accounts: `admin1` (admin) and `user1` (user), both with password `secret`
pub async fn seed_users(users: &UserStore) -> Result<()> {
    users.create("admin1", "secret", Role::Admin).await?;
    users.create("user1", "secret", Role::User).await
}
