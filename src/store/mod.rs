//! In-memory repositories
//!
//! All repositories sit on [`MemoryStore`], a lock-guarded map that copies
//! values across its boundary in both directions.

pub mod image;
pub mod laptop;
pub mod memory;
pub mod rating;
pub mod user;

pub use image::{BlobStore, DiskBlobStore, IdGenerator, ImageInfo, ImageStore, UuidGenerator};
pub use laptop::LaptopStore;
pub use memory::{KeyExists, MemoryStore};
pub use rating::{Rating, RatingStore};
pub use user::{seed_users, UserStore};
