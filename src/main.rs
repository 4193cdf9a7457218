//! Laptop catalog server

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use laptop_catalog::{Args, CatalogServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("laptop_catalog={},info", args.log_level).into());
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Laptop Catalog");
    info!("======================================");
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("Image dir: {}", args.image_dir.display());
    info!("Token TTL: {}s", args.token_ttl_seconds);
    info!("Seed users: {}", args.seed_users);
    info!("======================================");

    let server = CatalogServer::from_args(&args).await?;
    info!(
        image_dir = %server.stores().images.root_dir().display(),
        "Catalog server ready"
    );

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    Ok(())
}
