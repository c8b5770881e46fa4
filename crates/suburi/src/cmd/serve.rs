//! Serve command
//!
//! Opens the catalog and blob store, builds the router and serves it.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};

use suburi_api::auth::LocalJwtProvider;
use suburi_api::{AppState, build_router};
use suburi_config::Config;
use suburi_control::Catalog;
use suburi_store::{CapabilitySigner, LocalFsStore};

/// Development-only fallback secret; never used when one is configured
const DEV_SECRET: &[u8] = b"suburi-dev-secret-do-not-deploy-me!";

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "configs/suburi.toml")]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    pub log_level: String,
}

pub async fn run(args: ServeArgs) -> Result<()> {
    let config = if args.config.is_file() {
        Config::from_file(&args.config)
            .with_context(|| format!("loading config from {}", args.config.display()))?
    } else {
        info!(path = %args.config.display(), "No config file, using defaults");
        Config::default()
    };

    let secret: Vec<u8> = match std::env::var("SUBURI_AUTH_SECRET") {
        Ok(s) => s.into_bytes(),
        Err(_) => match &config.server.auth_secret {
            Some(s) => s.clone().into_bytes(),
            None => {
                warn!("No auth secret configured, using the development secret");
                DEV_SECRET.to_vec()
            }
        },
    };

    let catalog_path = format!("{}/catalog.db", config.server.data_dir);
    let catalog = Arc::new(
        Catalog::new(&catalog_path)
            .await
            .context("opening session catalog")?,
    );
    let store = Arc::new(LocalFsStore::new(format!(
        "{}/blobs",
        config.server.data_dir
    )));
    let auth = Arc::new(LocalJwtProvider::new(&secret));
    let signer = CapabilitySigner::new(&secret);

    let state = AppState::new(catalog, store, auth, signer)
        .with_token_ttl(chrono::Duration::minutes(config.server.capability_ttl_minutes));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.server.bind_addr))?;

    info!(addr = %config.server.bind_addr, "Suburi ingestion service listening");
    axum::serve(listener, app).await.context("serving")?;

    Ok(())
}
