//! Catalog server
//!
//! Owns the repositories and services, and runs every inbound call through
//! the access gate before dispatching it to its handler:
//!
//! ```text
//! call -> AccessControl::authorize(method, metadata) -> handler -> store
//! ```
//!
//! A `grpc-timeout` header on the request tightens the call's deadline.

use futures::Stream;
use std::sync::Arc;
use tonic::{Request, Response, Status};
use tracing::info;

use crate::auth::{catalog_policy, AccessControl, AccessPolicy, TokenService};
use crate::config::Args;
use crate::services::{
    method, AuthService, CallContext, CreateLaptopRequest, CreateLaptopResponse, LaptopService,
    LoginRequest, LoginResponse, RateLaptopRequest, RateLaptopResponse, ResponseStream,
    SearchLaptopRequest, SearchLaptopResponse, UploadImageRequest, UploadImageResponse,
};
use crate::store::{seed_users, ImageStore, LaptopStore, RatingStore, UserStore};
use crate::types::Result;

/// Shared repositories behind a server
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<UserStore>,
    pub laptops: Arc<LaptopStore>,
    pub images: Arc<ImageStore>,
    pub ratings: Arc<RatingStore>,
}

impl Stores {
    /// Empty repositories with images written under `image_store`'s root
    pub fn new(image_store: ImageStore) -> Self {
        Self {
            users: Arc::new(UserStore::new()),
            laptops: Arc::new(LaptopStore::new()),
            images: Arc::new(image_store),
            ratings: Arc::new(RatingStore::new()),
        }
    }
}

pub struct CatalogServer {
    access: AccessControl,
    auth: AuthService,
    laptops: LaptopService,
    stores: Stores,
}

impl CatalogServer {
    pub fn new(tokens: TokenService, policy: AccessPolicy, stores: Stores) -> Self {
        Self {
            access: AccessControl::new(tokens.clone(), policy),
            auth: AuthService::new(Arc::clone(&stores.users), tokens),
            laptops: LaptopService::new(
                Arc::clone(&stores.laptops),
                Arc::clone(&stores.images),
                Arc::clone(&stores.ratings),
            ),
            stores,
        }
    }

    /// Build a server from validated configuration
    pub async fn from_args(args: &Args) -> Result<Self> {
        let tokens = match &args.jwt_secret {
            Some(secret) => TokenService::new(secret.clone(), args.token_ttl())?,
            None => TokenService::new_dev().with_ttl(args.token_ttl()),
        };

        let stores = Stores::new(ImageStore::open(&args.image_dir).await?);
        if args.seed_users {
            seed_users(&stores.users).await?;
            info!("Seeded default users");
        }

        Ok(Self::new(tokens, catalog_policy(), stores))
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    fn gate<T>(&self, method: &str, request: &Request<T>) -> std::result::Result<(), Status> {
        self.access.authorize(method, request.metadata())?;
        Ok(())
    }

    pub async fn login(
        &self,
        request: Request<LoginRequest>,
    ) -> std::result::Result<Response<LoginResponse>, Status> {
        self.gate(method::LOGIN, &request)?;
        let res = self.auth.login(request.into_inner()).await?;
        Ok(Response::new(res))
    }

    pub async fn create_laptop(
        &self,
        ctx: CallContext,
        request: Request<CreateLaptopRequest>,
    ) -> std::result::Result<Response<CreateLaptopResponse>, Status> {
        self.gate(method::CREATE_LAPTOP, &request)?;
        let ctx = ctx.with_metadata(request.metadata());
        let res = self
            .laptops
            .create_laptop(&ctx, request.into_inner())
            .await?;
        Ok(Response::new(res))
    }

    pub async fn search_laptop(
        &self,
        ctx: CallContext,
        request: Request<SearchLaptopRequest>,
    ) -> std::result::Result<Response<ResponseStream<SearchLaptopResponse>>, Status> {
        self.gate(method::SEARCH_LAPTOP, &request)?;
        let ctx = ctx.with_metadata(request.metadata());
        Ok(Response::new(
            self.laptops.search_laptop(ctx, request.into_inner()),
        ))
    }

    pub async fn upload_image<S>(
        &self,
        ctx: CallContext,
        request: Request<S>,
    ) -> std::result::Result<Response<UploadImageResponse>, Status>
    where
        S: Stream<Item = std::result::Result<UploadImageRequest, Status>> + Unpin,
    {
        self.gate(method::UPLOAD_IMAGE, &request)?;
        let ctx = ctx.with_metadata(request.metadata());
        let res = self
            .laptops
            .upload_image(&ctx, request.into_inner())
            .await?;
        Ok(Response::new(res))
    }

    pub async fn rate_laptop<S>(
        &self,
        ctx: CallContext,
        request: Request<S>,
    ) -> std::result::Result<Response<ResponseStream<RateLaptopResponse>>, Status>
    where
        S: Stream<Item = std::result::Result<RateLaptopRequest, Status>> + Unpin + Send + 'static,
    {
        self.gate(method::RATE_LAPTOP, &request)?;
        let ctx = ctx.with_metadata(request.metadata());
        Ok(Response::new(
            self.laptops.rate_laptop(ctx, request.into_inner()),
        ))
    }
}
