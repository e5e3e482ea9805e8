//! Certgate - header-based mTLS authentication hydrator
//!
//! Wires the revocation cache, the background loader and the validation
//! hydrator together and serves the resolve endpoint until shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;

use certgate::config::{LogFormat, RevocationSourceConfig};
use certgate::revocation::{
    FileRevocationSource, HttpRevocationSource, RevocationCache, RevocationLoader,
    RevocationSource,
};
use certgate::{AppConfig, AppState, ValidationHydrator};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;

    init_logging(&config);
    info!("Certgate starting up");

    let revocations = Arc::new(RevocationCache::new());
    let source = revocation_source(&config.revocation.source);

    let loader = RevocationLoader::new(
        Arc::clone(&revocations),
        source,
        config.revocation.poll_interval(),
        config.revocation.fetch_timeout(),
    );
    let shutdown = CancellationToken::new();
    let loader_handle = tokio::spawn(loader.run(shutdown.clone()));

    let hydrator = Arc::new(
        ValidationHydrator::from_config(&config.hydrator, Arc::clone(&revocations))
            .context("Failed to build validation hydrator")?,
    );

    let state = AppState {
        config: Arc::new(config.clone()),
        revocations,
        hydrator,
    };
    let app = certgate::app(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down, stopping revocation loader");
    shutdown.cancel();
    let _ = loader_handle.await;
    info!("Shutdown complete");

    Ok(())
}

/// Build the configured revocation source collaborator
fn revocation_source(config: &RevocationSourceConfig) -> Arc<dyn RevocationSource> {
    match config {
        RevocationSourceConfig::File { path } => Arc::new(FileRevocationSource::new(path.clone())),
        RevocationSourceConfig::Http { url } => Arc::new(HttpRevocationSource::new(url.clone())),
    }
}

/// Initialize tracing based on configuration
fn init_logging(config: &AppConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.logging.format {
        LogFormat::Json => registry.with(fmt::layer().json().with_target(true)).init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_target(false))
            .init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).init(),
    }
}

/// Wait for ctrl-c or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
