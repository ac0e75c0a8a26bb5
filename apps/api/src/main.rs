mod batch;
mod config;
mod currency;
mod errors;
mod layout;
mod payroll;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::batch::retention::retention_task;
use crate::config::Config;
use crate::layout::Theme;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting payslip service v{}", env!("CARGO_PKG_VERSION"));

    // Build the default theme once; the logo is decoded here, not per render
    let theme = Theme::from_options(&config.theme).context("Invalid theme configuration")?;
    info!(
        palette = theme.palette.name(),
        logo = theme.logo.is_some(),
        organization = %theme.organization_name,
        "Theme ready"
    );

    tokio::fs::create_dir_all(&config.output_root)
        .await
        .with_context(|| format!("Cannot create output root {}", config.output_root.display()))?;
    info!(
        output_root = %config.output_root.display(),
        header_rows = config.header_rows,
        concurrency = config.concurrency,
        fail_fast = config.fail_fast,
        net_policy = ?config.net_policy,
        "Batch settings"
    );

    // Sweep old session directories now and hourly afterwards
    match config.session_retention {
        Some(max_age) => {
            info!(retention_hours = max_age.as_secs() / 3600, "Session retention enabled");
            tokio::spawn(retention_task(config.output_root.clone(), max_age));
        }
        None => info!("Session retention disabled; session directories are kept"),
    }

    // Build app state
    let state = AppState {
        config: config.clone(),
        theme: Arc::new(theme),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
