//! Laptop catalog
//!
//! An RPC service over a catalog of laptop records, with role-gated
//! mutation, chunked image upload and live rating aggregation.
//!
//! ## Layers
//!
//! - **Store**: concurrent in-memory repositories handing out copies
//! - **Auth**: signed access tokens and method-level role gating
//! - **Services**: unary and streaming call handlers
//! - **Server**: access gate in front of the handlers
//! - **Client**: login, token refresh and catalog calls

pub mod auth;
pub mod client;
pub mod config;
pub mod models;
pub mod server;
pub mod services;
pub mod store;
pub mod types;

pub use config::Args;
pub use server::{CatalogServer, Stores};
pub use types::{CatalogError, Result};
