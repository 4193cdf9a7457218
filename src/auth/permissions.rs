//! Roles and the method -> role table used to gate RPCs

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::services::method;
use crate::types::CatalogError;

/// Access level granted to a user and embedded in their token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May create laptops and upload images
    Admin,
    /// May rate laptops
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::User => write!(f, "user"),
        }
    }
}

impl FromStr for Role {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(CatalogError::InvalidArgument(format!("unknown role: {other}"))),
        }
    }
}

/// Static table of which roles may call which full method name.
/// Methods absent from the table are unrestricted.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    rules: HashMap<String, HashSet<Role>>,
}

impl AccessPolicy {
    /// Empty policy: every method is public
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict a method to the given roles
    pub fn allow(mut self, method: impl Into<String>, roles: &[Role]) -> Self {
        self.rules
            .entry(method.into())
            .or_default()
            .extend(roles.iter().copied());
        self
    }

    /// Roles allowed to call a method, or `None` if the method is unrestricted
    pub fn allowed_roles(&self, method: &str) -> Option<&HashSet<Role>> {
        self.rules.get(method)
    }

    /// Check whether a role may call a method
    pub fn is_allowed(&self, method: &str, role: Role) -> bool {
        match self.allowed_roles(method) {
            Some(roles) => roles.contains(&role),
            None => true,
        }
    }
}

/// The catalog's role table
pub fn catalog_policy() -> AccessPolicy {
    AccessPolicy::new()
        .allow(method::CREATE_LAPTOP, &[Role::Admin])
        .allow(method::UPLOAD_IMAGE, &[Role::Admin])
        .allow(method::RATE_LAPTOP, &[Role::Admin, Role::User])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_methods() {
        let policy = catalog_policy();
        assert!(policy.allowed_roles(method::LOGIN).is_none());
        assert!(policy.allowed_roles(method::SEARCH_LAPTOP).is_none());
        assert!(policy.is_allowed(method::SEARCH_LAPTOP, Role::User));
    }

    #[test]
    fn test_admin_methods() {
        let policy = catalog_policy();
        assert!(policy.is_allowed(method::CREATE_LAPTOP, Role::Admin));
        assert!(!policy.is_allowed(method::CREATE_LAPTOP, Role::User));
        assert!(policy.is_allowed(method::UPLOAD_IMAGE, Role::Admin));
        assert!(!policy.is_allowed(method::UPLOAD_IMAGE, Role::User));
    }

    #[test]
    fn test_rating_open_to_both_roles() {
        let policy = catalog_policy();
        assert!(policy.is_allowed(method::RATE_LAPTOP, Role::Admin));
        assert!(policy.is_allowed(method::RATE_LAPTOP, Role::User));
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::User.to_string(), "user");
        assert!("root".parse::<Role>().is_err());
    }
}
