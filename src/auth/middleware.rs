//! Server-side access gate
//!
//! Every call passes through [`AccessControl::authorize`] with its full
//! method name before the handler runs. Streaming calls are gated once,
//! before the first message is exchanged.

use tonic::metadata::MetadataMap;
use tracing::{debug, warn};

use crate::auth::{extract_token_from_header, AccessPolicy, Claims, TokenService};
use crate::types::CatalogError;

/// Metadata key carrying the bearer token
pub const AUTHORIZATION: &str = "authorization";

pub struct AccessControl {
    tokens: TokenService,
    policy: AccessPolicy,
}

impl AccessControl {
    pub fn new(tokens: TokenService, policy: AccessPolicy) -> Self {
        Self { tokens, policy }
    }

    /// Gate a call. Returns the verified claims for restricted methods and
    /// `None` for unrestricted ones.
    pub fn authorize(
        &self,
        method: &str,
        metadata: &MetadataMap,
    ) -> Result<Option<Claims>, CatalogError> {
        debug!(method, "--> access gate");

        if self.policy.allowed_roles(method).is_none() {
            return Ok(None);
        }

        let header = metadata
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        let token = extract_token_from_header(header).ok_or_else(|| {
            warn!(method, "authorization token is not provided");
            CatalogError::Unauthenticated("authorization token is not provided".into())
        })?;

        let claims = self.tokens.verify(token).map_err(|e| {
            warn!(method, error = %e, "rejected access token");
            e
        })?;

        if !self.policy.is_allowed(method, claims.role) {
            warn!(method, user = %claims.sub, role = %claims.role, "permission denied");
            return Err(CatalogError::PermissionDenied(
                "no permission to access this RPC".into(),
            ));
        }

        Ok(Some(claims))
    }
}
