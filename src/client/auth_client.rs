use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tonic::Request;
use tracing::debug;

use super::Login;
use crate::server::CatalogServer;
use crate::services::LoginRequest;
use crate::types::{CatalogError, Result};

/// Per-call login timeout
const LOGIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Logs in with a fixed username and password
pub struct AuthClient {
    server: Arc<CatalogServer>,
    username: String,
    password: String,
}

impl AuthClient {
    pub fn new(
        server: Arc<CatalogServer>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            server,
            username: username.into(),
            password: password.into(),
        }
    }
}

#[async_trait]
impl Login for AuthClient {
    async fn login(&self) -> Result<String> {
        let request = Request::new(LoginRequest {
            username: self.username.clone(),
            password: self.password.clone(),
        });

        let response = tokio::time::timeout(LOGIN_TIMEOUT, self.server.login(request))
            .await
            .map_err(|_| CatalogError::DeadlineExceeded)?
            .map_err(|status| CatalogError::from_status(&status))?;

        debug!(username = %self.username, "logged in");
        Ok(response.into_inner().access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{catalog_policy, TokenService};
    use crate::server::Stores;
    use crate::store::{seed_users, ImageStore};

    async fn server(dir: &std::path::Path) -> Arc<CatalogServer> {
        let stores = Stores::new(ImageStore::open(dir).await.unwrap());
        seed_users(&stores.users).await.unwrap();
        Arc::new(CatalogServer::new(
            TokenService::new_dev(),
            catalog_policy(),
            stores,
        ))
    }

    #[tokio::test]
    async fn test_login_returns_token() {
        let dir = tempfile::tempdir().unwrap();
        let client = AuthClient::new(server(dir.path()).await, "admin1", "secret");

        let token = client.login().await.unwrap();
        let claims = TokenService::new_dev().verify(&token).unwrap();
        assert_eq!(claims.sub, "admin1");
    }

    #[tokio::test]
    async fn test_wrong_password_maps_status() {
        let dir = tempfile::tempdir().unwrap();
        let client = AuthClient::new(server(dir.path()).await, "admin1", "nope");

        let err = client.login().await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }
}
