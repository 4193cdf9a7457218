//! Authentication and authorization
//!
//! Provides:
//! - JWT token issuance and verification
//! - Role table mapping RPC methods to allowed roles
//! - The server-side access gate
//! - Password hashing with Argon2

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod permissions;

pub use jwt::{Claims, TokenService, DEFAULT_TOKEN_TTL};
pub use middleware::{AccessControl, AUTHORIZATION};
pub use password::{hash_password, verify_password};
pub use permissions::{catalog_policy, AccessPolicy, Role};

/// Extract a token from an authorization value.
/// Supports "Bearer <token>" and raw tokens.
pub fn extract_token_from_header(auth_header: Option<&str>) -> Option<&str> {
    let header = auth_header?;

    if let Some(token) = header.strip_prefix("Bearer ") {
        let token = token.trim();
        if !token.is_empty() {
            return Some(token);
        }
    }

    if !header.contains(' ') {
        let token = header.trim();
        if !token.is_empty() {
            return Some(token);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_token_from_header() {
        assert_eq!(extract_token_from_header(Some("Bearer abc123")), Some("abc123"));
        assert_eq!(extract_token_from_header(Some("abc123")), Some("abc123"));
        assert_eq!(extract_token_from_header(None), None);
        assert_eq!(extract_token_from_header(Some("")), None);
        assert_eq!(extract_token_from_header(Some("Bearer ")), None);
        assert_eq!(extract_token_from_header(Some("Basic abc123")), None);
    }
}
