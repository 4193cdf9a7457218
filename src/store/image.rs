//! Image attachments
//!
//! Bytes go to a [`BlobStore`] under `<root>/<image id><image type>`; the
//! store itself only keeps the metadata of each finished upload.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::info;
use uuid::Uuid;

use super::memory::MemoryStore;
use crate::types::{CatalogError, Result};

/// Persists raw bytes at a path
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;
}

/// Produces globally unique opaque identifiers
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> Result<String>;
}

/// Random UUIDv4 identifiers
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> Result<String> {
        Ok(Uuid::new_v4().to_string())
    }
}

/// Blob store backed by the local filesystem
#[derive(Debug, Clone, Default)]
pub struct DiskBlobStore;

#[async_trait]
impl BlobStore for DiskBlobStore {
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        fs::write(path, data)
            .await
            .map_err(|e| CatalogError::Storage(format!("cannot write image file: {e}")))
    }
}

/// Metadata recorded once per finished upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub laptop_id: String,
    pub image_type: String,
    pub path: PathBuf,
}

pub struct ImageStore {
    root_dir: PathBuf,
    blobs: Arc<dyn BlobStore>,
    ids: Arc<dyn IdGenerator>,
    images: MemoryStore<String, ImageInfo>,
}

impl ImageStore {
    /// Image store writing to disk under `root_dir`, creating it if needed
    pub async fn open<P: AsRef<Path>>(root_dir: P) -> Result<Self> {
        let root_dir = root_dir.as_ref().to_path_buf();
        fs::create_dir_all(&root_dir).await?;

        info!(path = %root_dir.display(), "Initialized image store");

        Ok(Self::new(root_dir, Arc::new(DiskBlobStore)))
    }

    pub fn new(root_dir: PathBuf, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            root_dir,
            blobs,
            ids: Arc::new(UuidGenerator),
            images: MemoryStore::new(),
        }
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Persist the bytes and record their metadata, returning the image id
    pub async fn save(&self, laptop_id: &str, image_type: &str, data: &[u8]) -> Result<String> {
        let image_id = self
            .ids
            .generate()
            .map_err(|e| CatalogError::Internal(format!("cannot generate image id: {e}")))?;

        let path = self.root_dir.join(format!("{image_id}{image_type}"));
        self.blobs.write(&path, data).await?;

        let image = ImageInfo {
            laptop_id: laptop_id.to_string(),
            image_type: image_type.to_string(),
            path,
        };
        self.images
            .insert(image_id.clone(), &image)
            .await
            .map_err(|_| CatalogError::Internal(format!("duplicate image id: {image_id}")))?;

        info!(image_id = %image_id, laptop_id, size = data.len(), "Stored image");
        Ok(image_id)
    }

    pub async fn find(&self, image_id: &str) -> Option<ImageInfo> {
        self.images.get(&image_id.to_string()).await
    }

    pub async fn len(&self) -> usize {
        self.images.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.images.is_empty().await
    }
}
