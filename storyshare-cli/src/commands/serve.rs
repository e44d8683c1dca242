//! HTTP server command
//!
//! Loads configuration from the environment, builds the connection provider
//! and image host, then runs the API until shutdown.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use storyshare_server::http::{run_server, AppState, ServerConfig};
use storyshare_server::AppConfig;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (default: 127.0.0.1:5000)
    #[arg(long, short = 'b', default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Directory of front-end pages served for non-API paths
    #[arg(long, value_name = "DIR")]
    pub static_dir: Option<PathBuf>,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = AppConfig::from_env().context("Invalid configuration")?;
    config.warn_on_gaps();

    if config.debug {
        tracing::debug!(?config, "Loaded configuration");
    }

    if let Some(dir) = &args.static_dir {
        anyhow::ensure!(
            dir.is_dir(),
            "Static directory not found: {}",
            dir.display()
        );
    }

    tracing::info!("Starting storyshare server on {}", args.bind);

    let state = AppState::from_config(&config).await;
    if !state.db.is_pooled() {
        tracing::warn!("Running without a connection pool; each request opens its own connection");
    }

    let server_config = ServerConfig {
        bind_addr: args.bind,
        cors_permissive: args.cors_permissive,
        static_dir: args.static_dir,
    };

    // Run server (blocks until shutdown)
    run_server(state, server_config)
        .await
        .context("Server error")?;

    Ok(())
}
