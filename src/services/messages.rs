//! Request and response messages of the catalog RPCs

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::models::{Filter, Laptop};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateLaptopRequest {
    pub laptop: Laptop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateLaptopResponse {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchLaptopRequest {
    pub filter: Filter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchLaptopResponse {
    pub laptop: Laptop,
}

/// Header of an upload: which laptop, and the file suffix (e.g. ".jpg")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageHeader {
    pub laptop_id: String,
    pub image_type: String,
}

/// One message of an upload stream. The first must be `Info`, every later
/// one `ChunkData`.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadImageRequest {
    Info(ImageHeader),
    ChunkData(Bytes),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadImageResponse {
    pub id: String,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLaptopRequest {
    pub laptop_id: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLaptopResponse {
    pub laptop_id: String,
    pub rated_count: u32,
    pub average_score: f64,
}
