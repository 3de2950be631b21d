use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use microcredit_api::{app, auth, cli::Cli, gateway, resources::catalog};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up SUPABASE_URL, DATABASE_URL, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli
        .config(|key| std::env::var(key).ok())
        .context("invalid configuration")?;

    if cli.check_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }
    tracing::info!("Starting Microcredit API in {:?} mode", config.environment);

    let gateway = gateway::connect(&config.gateway, catalog::ALL)
        .await
        .context("failed to initialise data gateway")?;
    let access = auth::from_config(&config.security).context("failed to initialise access policy")?;

    let router = app::with_layers(app::router(app::AppState::new(gateway, access)), &config);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Microcredit API listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
