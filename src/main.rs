//! Pib Journal backend

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pib_journal::{
    auth::hash_password,
    config::{Args, Command},
    server::{self, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    if let Some(Command::HashPassword { ref password }) = args.command {
        println!("{}", hash_password(password)?);
        return Ok(());
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("pib_journal={},info", args.log_level).into());
    let registry = tracing_subscriber::registry().with(filter);
    if args.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Pib Journal backend v{}", env!("CARGO_PKG_VERSION"));
    info!("======================================");
    info!("Listen: {}", args.listen_addr());
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("Admin user: {}", args.admin_user);
    info!("Storage API: {}", args.storage.filess_api_base);
    match args.index_ref() {
        Some(index) => info!("Index: pinned to {}", index),
        None => info!("Index: located by name on first read"),
    }
    info!("Prune index versions: {}", args.storage.prune_index_versions);
    info!("CORS origin: {}", args.cors_origin);
    info!("======================================");

    let state = AppState::from_args(args)?;
    server::run(Arc::new(state)).await?;

    Ok(())
}
