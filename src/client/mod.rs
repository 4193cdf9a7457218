//! In-process clients for the catalog server
//!
//! [`AuthClient`] logs in, [`CredentialInterceptor`] keeps the resulting
//! token fresh and attaches it to outgoing calls, and [`LaptopClient`]
//! drives the laptop RPCs.

use async_trait::async_trait;

use crate::types::Result;

pub mod auth_client;
pub mod interceptor;
pub mod laptop_client;

pub use auth_client::AuthClient;
pub use interceptor::{CredentialInterceptor, InterceptorConfig};
pub use laptop_client::LaptopClient;

/// Source of fresh access tokens
#[async_trait]
pub trait Login: Send + Sync {
    async fn login(&self) -> Result<String>;
}
