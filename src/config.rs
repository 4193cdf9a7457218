//! Configuration for the catalog server
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::jwt::{MAX_TOKEN_TTL, MIN_SECRET_LEN};

/// Laptop catalog server
#[derive(Parser, Debug, Clone)]
#[command(name = "laptop-catalog")]
#[command(about = "Laptop catalog with role-gated mutation, image upload and live ratings")]
pub struct Args {
    /// JWT secret for token signing (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// Access token lifetime in seconds
    #[arg(long, env = "TOKEN_TTL_SECONDS", default_value = "900")]
    pub token_ttl_seconds: u64,

    /// Directory uploaded images are written to
    #[arg(long, env = "IMAGE_DIR", default_value = "img")]
    pub image_dir: PathBuf,

    /// Enable development mode (allows the built-in insecure secret)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Create the admin1/user1 accounts at startup
    #[arg(long, env = "SEED_USERS", default_value = "true", action = clap::ArgAction::Set)]
    pub seed_users: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,
}

impl Args {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_seconds)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode {
            match &self.jwt_secret {
                None => return Err("JWT_SECRET is required in production mode".to_string()),
                Some(secret) if secret.len() < MIN_SECRET_LEN => {
                    return Err(format!(
                        "JWT_SECRET must be at least {MIN_SECRET_LEN} characters"
                    ))
                }
                Some(_) => {}
            }
        }

        if self.token_ttl_seconds == 0 {
            return Err("TOKEN_TTL_SECONDS must be greater than zero".to_string());
        }

        if self.token_ttl() > MAX_TOKEN_TTL {
            return Err(format!(
                "TOKEN_TTL_SECONDS must be at most {}",
                MAX_TOKEN_TTL.as_secs()
            ));
        }

        Ok(())
    }
}
