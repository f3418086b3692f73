use anyhow::{Context, Result};
use clap::Parser;
use geoip_heatmap::{cli, config, routes, state, static_assets};
use tokio::net::TcpListener;

async fn bind_listener(addr: &str) -> Result<TcpListener> {
    match TcpListener::bind(addr).await {
        Ok(listener) => Ok(listener),
        Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
            anyhow::bail!(
                "Failed to bind geoip-heatmap listener on {addr}: port already in use. Stop the other service using this port or re-run with --port to choose another port.",
            );
        }
        Err(err) => {
            Err(err).with_context(|| format!("failed to bind geoip-heatmap listener on {addr}"))
        }
    }
}

fn init_tracing(log_level: &str) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(log_level.to_lowercase()))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    // Before config loading, which may warn about bad values.
    init_tracing(&config::log_level_from_env())?;
    let config = config::HeatmapConfig::from_env(args.static_root.clone());

    tracing::info!(
        influx = %config.influx_base_url(),
        db = %config.influx_database,
        measurement = %config.measurement,
        window = %config.time_window,
        cache_seconds = config.cache_seconds,
        max_points = config.max_points,
        debug = config.debug,
        log_level = %config.log_level,
        "starting geoip-heatmap"
    );

    let static_root = config.static_root.clone();
    let http = reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")?;
    let state = state::AppState::new(config, http);

    let app = routes::router(state).fallback_service(static_assets::service(static_root)?);
    let addr = format!("{}:{}", args.host, args.port);
    let listener = bind_listener(&addr).await?;
    tracing::info!(bind = %addr, "geoip-heatmap HTTP listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
