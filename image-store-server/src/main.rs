mod errors;
mod params;
mod services;

use actix_web::{web, App, HttpServer};
use blob_storage::{BlobService, BlobStores, StorageConfig};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use crate::params::Args;
use crate::services::gallery_service::AppState;


#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Pick the backend once; it never changes while serving.
    let config = StorageConfig::select(&args.storage_settings());
    let deployment_type = config.deployment_type();
    tracing::info!("Serving files from {} storage at {}", deployment_type.to_uppercase(), config.location());

    let stores = BlobStores::connect(&config).await.map_err(|e| {
        tracing::error!("Unable to open storage: {}", e);
        std::io::Error::other(e)
    })?;

    let shared_state = web::Data::new(AppState::new(
        BlobService::new(stores),
        deployment_type,
        config.location(),
    ));

    tracing::info!("Listening on {}", args.http_addr);
    HttpServer::new(move || {
        App::new()
            .app_data(shared_state.clone())
            .configure(services::configure)
    })
        .bind(args.http_addr.clone())?
        .run()
        .await
}
