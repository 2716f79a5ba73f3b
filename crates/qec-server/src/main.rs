//! QEC-SFT analysis daemon
//!
//! Serves the analysis pipeline over HTTP. Provider credentials, the OPA
//! endpoint and pipeline tuning come from the environment; without any
//! provider key every artifact is produced from templates.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use qec_runtime::{AnalysisEngine, QecMetrics, RuntimeConfig, SERVICE_VERSION};
use qec_server::{create_router, AppState};

/// QEC-SFT daemon CLI
#[derive(Parser)]
#[command(name = "qecd")]
#[command(about = "QEC-SFT governance analysis service", long_about = None)]
#[command(version)]
struct Cli {
    /// Listen address
    #[arg(short, long, env = "QEC_LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    listen: SocketAddr,

    /// Log level
    #[arg(long, env = "QEC_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long = "json-logs", env = "QEC_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_level.clone().into());

    if cli.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let config = RuntimeConfig::from_env().context("invalid runtime configuration")?;
    let metrics = Arc::new(QecMetrics::new().context("failed to register metrics")?);
    let engine = AnalysisEngine::from_config(config, metrics)?;

    let status = engine.status();
    tracing::info!(
        version = SERVICE_VERSION,
        nvidia = status.ai_providers.nvidia,
        groq = status.ai_providers.groq,
        opa_endpoint = %status.opa_endpoint,
        "QEC-SFT engine ready"
    );
    if !status.ai_providers.nvidia && !status.ai_providers.groq {
        tracing::warn!("No AI provider configured; running in template-only mode");
    }

    let app = create_router(AppState::new(Arc::new(engine)));

    let listener = TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("failed to bind {}", cli.listen))?;
    tracing::info!("QEC-SFT daemon listening on {}", cli.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("QEC-SFT daemon shutting down");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
