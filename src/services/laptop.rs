//! Laptop service handlers
//!
//! ```text
//! CreateLaptop   unary          validate id -> check ctx -> save
//! SearchLaptop   server stream  scan -> send one response per match
//! UploadImage    client stream  header -> chunks (size capped) -> save on EOF
//! RateLaptop     bidi stream    recv -> check laptop -> aggregate -> send
//! ```
//!
//! Streaming responses are produced by a spawned task feeding a bounded
//! channel, so a slow reader suspends the handler at its next send.

use bytes::BytesMut;
use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::Status;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::context::CallContext;
use super::messages::*;
use crate::store::{ImageStore, LaptopStore, RatingStore};
use crate::types::{CatalogError, Result};

/// Upload size cap: 1 MiB
pub const MAX_IMAGE_SIZE: usize = 1 << 20;

/// Outbound messages buffered per streaming call
const STREAM_BUFFER: usize = 4;

/// Server-side response stream of a streaming RPC
pub type ResponseStream<T> = ReceiverStream<std::result::Result<T, Status>>;

pub struct LaptopService {
    laptops: Arc<LaptopStore>,
    images: Arc<ImageStore>,
    ratings: Arc<RatingStore>,
}

impl LaptopService {
    pub fn new(laptops: Arc<LaptopStore>, images: Arc<ImageStore>, ratings: Arc<RatingStore>) -> Self {
        Self {
            laptops,
            images,
            ratings,
        }
    }

    /// Store a new laptop, assigning a fresh UUID when the id is empty
    pub async fn create_laptop(
        &self,
        ctx: &CallContext,
        req: CreateLaptopRequest,
    ) -> Result<CreateLaptopResponse> {
        let mut laptop = req.laptop;
        info!(laptop_id = %laptop.id, "receive a create-laptop request");

        if laptop.id.is_empty() {
            laptop.id = Uuid::new_v4().to_string();
        } else {
            Uuid::parse_str(&laptop.id).map_err(|e| log_error(e.into()))?;
        }

        ctx.check().map_err(log_error)?;

        self.laptops.save(&laptop).await.map_err(log_error)?;

        info!(laptop_id = %laptop.id, "saved laptop");
        Ok(CreateLaptopResponse { id: laptop.id })
    }

    /// Stream every stored laptop matching the filter
    pub fn search_laptop(
        &self,
        ctx: CallContext,
        req: SearchLaptopRequest,
    ) -> ResponseStream<SearchLaptopResponse> {
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let laptops = Arc::clone(&self.laptops);
        let filter = req.filter;
        info!(filter = ?filter, "receive a search-laptop request");

        tokio::spawn(async move {
            let result = laptops
                .search(&ctx, &filter, |laptop| {
                    let tx = tx.clone();
                    async move {
                        let laptop_id = laptop.id.clone();
                        match tx.send(Ok(SearchLaptopResponse { laptop })).await {
                            Ok(()) => {
                                debug!(laptop_id = %laptop_id, "sent laptop");
                                Ok(())
                            }
                            Err(_) => Err(CatalogError::Unknown("cannot send search response".into())),
                        }
                    }
                })
                .await;

            if let Err(e) = result {
                let _ = tx.send(Err(log_error(e).into())).await;
            }
        });

        ReceiverStream::new(rx)
    }

    /// Accumulate an image upload and store it once the client finishes
    pub async fn upload_image<S>(&self, ctx: &CallContext, mut inbound: S) -> Result<UploadImageResponse>
    where
        S: Stream<Item = std::result::Result<UploadImageRequest, Status>> + Unpin,
    {
        let header = match inbound.next().await {
            Some(Ok(UploadImageRequest::Info(header))) => header,
            Some(Ok(UploadImageRequest::ChunkData(_))) => {
                return Err(log_error(CatalogError::Unknown(
                    "cannot receive image info: first message carries no image info".into(),
                )))
            }
            Some(Err(status)) => {
                return Err(log_error(CatalogError::Unknown(format!(
                    "cannot receive image info: {}",
                    status.message()
                ))))
            }
            None => {
                return Err(log_error(CatalogError::Unknown(
                    "cannot receive image info: stream closed".into(),
                )))
            }
        };

        info!(
            laptop_id = %header.laptop_id,
            image_type = %header.image_type,
            "receive an upload-image request"
        );

        if !self.laptops.exists(&header.laptop_id).await {
            return Err(log_error(CatalogError::InvalidArgument(format!(
                "laptop {} doesn't exist",
                header.laptop_id
            ))));
        }

        let mut image_data = BytesMut::new();
        let mut image_size = 0usize;

        loop {
            ctx.check().map_err(log_error)?;

            let chunk = match inbound.next().await {
                None => {
                    debug!("no more data");
                    break;
                }
                Some(Ok(UploadImageRequest::ChunkData(chunk))) => chunk,
                Some(Ok(UploadImageRequest::Info(_))) => {
                    return Err(log_error(CatalogError::Unknown(
                        "cannot receive chunk data: unexpected image info".into(),
                    )))
                }
                Some(Err(status)) => {
                    return Err(log_error(CatalogError::Unknown(format!(
                        "cannot receive chunk data: {}",
                        status.message()
                    ))))
                }
            };

            debug!(size = chunk.len(), "received a chunk");
            image_size += chunk.len();

            if image_size > MAX_IMAGE_SIZE {
                return Err(log_error(CatalogError::InvalidArgument(format!(
                    "image is too large: {image_size} > {MAX_IMAGE_SIZE}"
                ))));
            }

            image_data.extend_from_slice(&chunk);
        }

        let id = self
            .images
            .save(&header.laptop_id, &header.image_type, &image_data)
            .await
            .map_err(log_error)?;

        info!(image_id = %id, size = image_size, "saved image");
        Ok(UploadImageResponse {
            id,
            // Bounded by MAX_IMAGE_SIZE
            size: image_size as u32,
        })
    }

    /// Answer each inbound rating with the laptop's updated aggregate, in order
    pub fn rate_laptop<S>(&self, ctx: CallContext, inbound: S) -> ResponseStream<RateLaptopResponse>
    where
        S: Stream<Item = std::result::Result<RateLaptopRequest, Status>> + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let laptops = Arc::clone(&self.laptops);
        let ratings = Arc::clone(&self.ratings);

        tokio::spawn(async move {
            let result = rate_loop(&ctx, &laptops, &ratings, inbound, &tx).await;
            if let Err(e) = result {
                let _ = tx.send(Err(log_error(e).into())).await;
            }
        });

        ReceiverStream::new(rx)
    }
}

async fn rate_loop<S>(
    ctx: &CallContext,
    laptops: &LaptopStore,
    ratings: &RatingStore,
    mut inbound: S,
    tx: &mpsc::Sender<std::result::Result<RateLaptopResponse, Status>>,
) -> Result<()>
where
    S: Stream<Item = std::result::Result<RateLaptopRequest, Status>> + Unpin,
{
    loop {
        ctx.check()?;

        let req = match inbound.next().await {
            None => {
                debug!("no more data");
                return Ok(());
            }
            Some(Ok(req)) => req,
            Some(Err(status)) => {
                return Err(CatalogError::Unknown(format!(
                    "cannot receive stream request: {}",
                    status.message()
                )))
            }
        };

        debug!(laptop_id = %req.laptop_id, score = req.score, "received a rate-laptop request");

        if !laptops.exists(&req.laptop_id).await {
            return Err(CatalogError::NotFound(format!(
                "laptop id {} is not found",
                req.laptop_id
            )));
        }

        let rating = ratings.add(&req.laptop_id, req.score).await;
        let res = RateLaptopResponse {
            laptop_id: req.laptop_id,
            rated_count: rating.count,
            average_score: rating.average().unwrap_or_default(),
        };

        tx.send(Ok(res))
            .await
            .map_err(|_| CatalogError::Unknown("cannot send stream response".into()))?;
    }
}

fn log_error(err: CatalogError) -> CatalogError {
    warn!(code = ?err.code(), "{}", err);
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Laptop;
    use bytes::Bytes;
    use std::path::Path;
    use tonic::Code;

    async fn service(image_dir: &Path) -> (LaptopService, Arc<LaptopStore>, Arc<ImageStore>) {
        let laptops = Arc::new(LaptopStore::new());
        let images = Arc::new(ImageStore::open(image_dir).await.unwrap());
        let ratings = Arc::new(RatingStore::new());
        let svc = LaptopService::new(Arc::clone(&laptops), Arc::clone(&images), ratings);
        (svc, laptops, images)
    }

    fn laptop(id: &str) -> Laptop {
        Laptop {
            id: id.into(),
            brand: "Apple".into(),
            name: "Macbook Pro".into(),
            price_usd: 2500.0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_assigns_id_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        let (svc, laptops, _) = service(dir.path()).await;

        let res = svc
            .create_laptop(&CallContext::new(), CreateLaptopRequest { laptop: laptop("") })
            .await
            .unwrap();

        assert!(Uuid::parse_str(&res.id).is_ok());
        assert!(laptops.find(&res.id).await.is_some());
    }

    #[tokio::test]
    async fn test_create_rejects_non_uuid() {
        let dir = tempfile::tempdir().unwrap();
        let (svc, laptops, _) = service(dir.path()).await;

        let err = svc
            .create_laptop(&CallContext::new(), CreateLaptopRequest { laptop: laptop("invalid") })
            .await
            .unwrap_err();

        assert_eq!(err.code(), Code::InvalidArgument);
        assert!(laptops.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let (svc, _, _) = service(dir.path()).await;
        let id = Uuid::new_v4().to_string();

        svc.create_laptop(&CallContext::new(), CreateLaptopRequest { laptop: laptop(&id) })
            .await
            .unwrap();
        let err = svc
            .create_laptop(&CallContext::new(), CreateLaptopRequest { laptop: laptop(&id) })
            .await
            .unwrap_err();

        assert_eq!(err.code(), Code::AlreadyExists);
    }

    #[tokio::test]
    async fn test_create_canceled_stores_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (svc, laptops, _) = service(dir.path()).await;
        let ctx = CallContext::new();
        ctx.cancel();

        let err = svc
            .create_laptop(&ctx, CreateLaptopRequest { laptop: laptop("") })
            .await
            .unwrap_err();

        assert_eq!(err.code(), Code::Cancelled);
        assert!(laptops.is_empty().await);
    }

    #[tokio::test]
    async fn test_upload_requires_header_first() {
        let dir = tempfile::tempdir().unwrap();
        let (svc, _, _) = service(dir.path()).await;

        let inbound = futures::stream::iter(vec![Ok::<_, Status>(UploadImageRequest::ChunkData(
            Bytes::from_static(b"abc"),
        ))]);
        let err = svc.upload_image(&CallContext::new(), inbound).await.unwrap_err();
        assert_eq!(err.code(), Code::Unknown);
    }

    #[tokio::test]
    async fn test_upload_unknown_laptop() {
        let dir = tempfile::tempdir().unwrap();
        let (svc, _, images) = service(dir.path()).await;

        let inbound = futures::stream::iter(vec![Ok::<_, Status>(UploadImageRequest::Info(ImageHeader {
            laptop_id: Uuid::new_v4().to_string(),
            image_type: ".jpg".into(),
        }))]);
        let err = svc.upload_image(&CallContext::new(), inbound).await.unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);
        assert!(images.is_empty().await);
    }

    #[tokio::test]
    async fn test_upload_canceled_mid_stream() {
        let dir = tempfile::tempdir().unwrap();
        let (svc, laptops, images) = service(dir.path()).await;
        let id = Uuid::new_v4().to_string();
        laptops.save(&laptop(&id)).await.unwrap();

        let ctx = CallContext::new();
        let cancel_after_first = ctx.clone();
        let messages = vec![
            UploadImageRequest::Info(ImageHeader {
                laptop_id: id,
                image_type: ".png".into(),
            }),
            UploadImageRequest::ChunkData(Bytes::from_static(b"one")),
            UploadImageRequest::ChunkData(Bytes::from_static(b"two")),
        ];
        let inbound = futures::stream::iter(messages.into_iter().enumerate()).map(move |(i, m)| {
            if i == 1 {
                cancel_after_first.cancel();
            }
            Ok::<_, Status>(m)
        });

        let err = svc.upload_image(&ctx, inbound).await.unwrap_err();
        assert_eq!(err.code(), Code::Cancelled);
        assert!(images.is_empty().await);
    }

    #[tokio::test]
    async fn test_rate_unknown_laptop_aborts_stream() {
        let dir = tempfile::tempdir().unwrap();
        let (svc, laptops, _) = service(dir.path()).await;
        let id = Uuid::new_v4().to_string();
        laptops.save(&laptop(&id)).await.unwrap();

        let inbound = futures::stream::iter(vec![
            Ok::<_, Status>(RateLaptopRequest {
                laptop_id: id.clone(),
                score: 9.0,
            }),
            Ok(RateLaptopRequest {
                laptop_id: "missing".into(),
                score: 1.0,
            }),
            Ok(RateLaptopRequest {
                laptop_id: id,
                score: 5.0,
            }),
        ]);

        let responses: Vec<_> = svc.rate_laptop(CallContext::new(), inbound).collect().await;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].as_ref().unwrap().rated_count, 1);
        assert_eq!(responses[1].as_ref().unwrap_err().code(), Code::NotFound);
    }
}
