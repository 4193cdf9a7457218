//! Login service
//!
//! Exchanges a username and password for a signed access token.

use std::sync::Arc;
use tracing::{info, warn};

use super::messages::{LoginRequest, LoginResponse};
use crate::auth::TokenService;
use crate::store::UserStore;
use crate::types::{CatalogError, Result};

pub struct AuthService {
    users: Arc<UserStore>,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(users: Arc<UserStore>, tokens: TokenService) -> Self {
        Self { users, tokens }
    }

    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse> {
        // Same error for unknown user and wrong password to prevent user enumeration
        let user = match self.users.find(&req.username).await {
            Some(user) if user.is_correct_password(&req.password) => user,
            _ => {
                warn!(username = %req.username, "Login failed");
                return Err(CatalogError::NotFound("incorrect username/password".into()));
            }
        };

        let access_token = self.tokens.issue(&user.username, user.role)?;

        info!(username = %user.username, role = %user.role, "Login successful");
        Ok(LoginResponse { access_token })
    }
}
