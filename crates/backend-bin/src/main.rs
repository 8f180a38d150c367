// ============================
// crates/backend-bin/src/main.rs
// ============================
//! Tokio / Axum entry-point for the SSO token service.
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sso_backend_lib::{
    config::{load_settings, Settings},
    create_router,
    storage::{FlatFileStorage, IdentityStore, MemoryStorage},
    AppState,
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "sso-server", about = "SSO token issuance and registration service")]
struct Cli {
    /// Settings file
    #[arg(long, default_value = "config/default.toml")]
    config: PathBuf,

    /// Override the configured bind address
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Keep identities in memory instead of the data directory
    #[arg(long)]
    memory: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = load_settings(&cli.config)
        .with_context(|| format!("failed to load settings from {}", cli.config.display()))?;
    if let Some(bind) = cli.bind {
        settings.bind_addr = bind;
    }

    init_tracing(&settings, cli.json_logs);

    if cli.memory {
        serve(MemoryStorage::new(), settings).await
    } else {
        let store = FlatFileStorage::new(&settings.data_dir)?;
        serve(store, settings).await
    }
}

// RUST_LOG wins over the configured level
fn init_tracing(settings: &Settings, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

async fn serve<S: IdentityStore + Clone + 'static>(store: S, settings: Settings) -> Result<()> {
    let addr = settings.bind_addr;
    let state = Arc::new(AppState::new(store, settings)?);
    let app = create_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
