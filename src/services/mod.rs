//! RPC handlers
//!
//! - `AuthService`: login against the user registry
//! - `LaptopService`: create, search, image upload and rating

pub mod auth;
pub mod context;
pub mod laptop;
pub mod messages;

pub use auth::AuthService;
pub use context::CallContext;
pub use laptop::{LaptopService, ResponseStream, MAX_IMAGE_SIZE};
pub use messages::*;

/// Full method names, as seen by the access gate and the client interceptor
pub mod method {
    pub const LOGIN: &str = "/laptop.catalog.v1.AuthService/Login";
    pub const CREATE_LAPTOP: &str = "/laptop.catalog.v1.LaptopService/CreateLaptop";
    pub const SEARCH_LAPTOP: &str = "/laptop.catalog.v1.LaptopService/SearchLaptop";
    pub const UPLOAD_IMAGE: &str = "/laptop.catalog.v1.LaptopService/UploadImage";
    pub const RATE_LAPTOP: &str = "/laptop.catalog.v1.LaptopService/RateLaptop";
}
