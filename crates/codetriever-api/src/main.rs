//! Codetriever API server entry point.
//!
//! Loads configuration, bootstraps the application state (C3-C8 wired
//! together), and serves the HTTP control plane and query endpoint.

use std::net::SocketAddr;

use clap::Parser;
use codetriever_api::{bootstrap, routes};
use codetriever_config::ApplicationConfig;
use tracing::info;

/// Codetriever API server.
#[derive(Parser, Debug)]
#[command(name = "codetriever-api", version, about)]
struct Cli {
    /// Address to bind the HTTP server to.
    #[arg(long, default_value = "0.0.0.0:8080")]
    bind: SocketAddr,
}

type MainResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> MainResult {
    codetriever_common::initialize_environment();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    info!("Starting codetriever API server...");
    let config = ApplicationConfig::load()?;

    let state = bootstrap::initialize_app_state(&config).await?;
    let app = routes::create_router().with_state(state);

    info!(addr = %cli.bind, "listening");
    let listener = tokio::net::TcpListener::bind(cli.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
