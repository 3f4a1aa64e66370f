//! CertForge Server — Application entry point.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use certforge_db::{DbManager, run_migrations};
use certforge_server::{AppConfig, AppState, router};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "certforge", about = "Certificate issuance ledger and verification server")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, env = "CERTFORGE_CONFIG", default_value = "certforge.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("certforge=info".parse()?))
        .json()
        .init();

    let args = Args::parse();
    info!(config = %args.config.display(), "Starting CertForge server...");

    let config = AppConfig::load(&args.config)?;

    let db = DbManager::connect(&config.db_config())
        .await
        .context("failed to connect to SurrealDB")?;
    run_migrations(db.client())
        .await
        .context("failed to run migrations")?;

    let state = AppState::new(db.client().clone(), config.auth_config()?)
        .context("failed to initialise authentication")?;

    for user in config.users.iter().cloned() {
        state
            .auth
            .provision_user(user.into())
            .await
            .context("failed to provision bootstrap user")?;
    }

    let listener = tokio::net::TcpListener::bind(config.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;
    info!(addr = %config.server.bind, "CertForge server listening");

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    info!("CertForge server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
}
