use bytes::Bytes;
use futures::{stream, StreamExt};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tonic::{Request, Status};
use tracing::{info, warn};

use super::CredentialInterceptor;
use crate::models::{Filter, Laptop};
use crate::server::CatalogServer;
use crate::services::{
    method, CallContext, CreateLaptopRequest, ImageHeader, RateLaptopRequest, RateLaptopResponse,
    SearchLaptopRequest, UploadImageRequest, UploadImageResponse,
};

/// Upload chunk size
const CHUNK_SIZE: usize = 1024;

/// Timeout sent with each call
const CALL_TIMEOUT: Duration = Duration::from_secs(5);

pub struct LaptopClient {
    server: Arc<CatalogServer>,
    credentials: Arc<CredentialInterceptor>,
}

impl LaptopClient {
    pub fn new(server: Arc<CatalogServer>, credentials: Arc<CredentialInterceptor>) -> Self {
        Self {
            server,
            credentials,
        }
    }

    fn request<T>(&self, method: &str, message: T) -> Result<Request<T>, Status> {
        let mut request = Request::new(message);
        request.set_timeout(CALL_TIMEOUT);
        Ok(self.credentials.intercept(method, request)?)
    }

    /// Create a laptop and return its id
    pub async fn create_laptop(&self, laptop: Laptop) -> Result<String, Status> {
        let request = self.request(method::CREATE_LAPTOP, CreateLaptopRequest { laptop })?;
        let res = self
            .server
            .create_laptop(CallContext::new(), request)
            .await?;

        let id = res.into_inner().id;
        info!(laptop_id = %id, "created laptop");
        Ok(id)
    }

    /// Collect every laptop matching the filter
    pub async fn search_laptop(&self, filter: Filter) -> Result<Vec<Laptop>, Status> {
        let request = self.request(method::SEARCH_LAPTOP, SearchLaptopRequest { filter })?;
        let mut stream = self
            .server
            .search_laptop(CallContext::new(), request)
            .await?
            .into_inner();

        let mut found = Vec::new();
        while let Some(res) = stream.next().await {
            let laptop = res?.laptop;
            info!(laptop_id = %laptop.id, brand = %laptop.brand, "found laptop");
            found.push(laptop);
        }
        Ok(found)
    }

    /// Upload image bytes in fixed-size chunks
    pub async fn upload_image(
        &self,
        laptop_id: &str,
        image_type: &str,
        data: &[u8],
    ) -> Result<UploadImageResponse, Status> {
        let header = UploadImageRequest::Info(ImageHeader {
            laptop_id: laptop_id.to_string(),
            image_type: image_type.to_string(),
        });
        let messages: Vec<Result<UploadImageRequest, Status>> = std::iter::once(header)
            .chain(
                data.chunks(CHUNK_SIZE)
                    .map(|chunk| UploadImageRequest::ChunkData(Bytes::copy_from_slice(chunk))),
            )
            .map(Ok)
            .collect();

        let request = self.request(method::UPLOAD_IMAGE, stream::iter(messages))?;
        let res = self
            .server
            .upload_image(CallContext::new(), request)
            .await?
            .into_inner();

        info!(image_id = %res.id, size = res.size, "uploaded image");
        Ok(res)
    }

    /// Upload an image file; its extension becomes the image type
    pub async fn upload_image_file(
        &self,
        laptop_id: &str,
        path: impl AsRef<Path>,
    ) -> Result<UploadImageResponse, Status> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await.map_err(|e| {
            warn!(path = %path.display(), error = %e, "cannot open image file");
            Status::invalid_argument(format!("cannot open image file: {e}"))
        })?;
        let image_type = path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        self.upload_image(laptop_id, &image_type, &data).await
    }

    /// Send one rating per laptop and collect the updated aggregates in order
    pub async fn rate_laptop(
        &self,
        laptop_ids: &[String],
        scores: &[f64],
    ) -> Result<Vec<RateLaptopResponse>, Status> {
        let messages: Vec<Result<RateLaptopRequest, Status>> = laptop_ids
            .iter()
            .zip(scores)
            .map(|(laptop_id, score)| {
                Ok(RateLaptopRequest {
                    laptop_id: laptop_id.clone(),
                    score: *score,
                })
            })
            .collect();

        let request = self.request(method::RATE_LAPTOP, stream::iter(messages))?;
        let mut stream = self
            .server
            .rate_laptop(CallContext::new(), request)
            .await?
            .into_inner();

        let mut responses = Vec::with_capacity(laptop_ids.len());
        while let Some(res) = stream.next().await {
            let res = res?;
            info!(
                laptop_id = %res.laptop_id,
                rated_count = res.rated_count,
                average_score = res.average_score,
                "received rating"
            );
            responses.push(res);
        }
        Ok(responses)
    }
}
