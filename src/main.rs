//! PDF Service
//!
//! Fetches the issuer's signing keys once, then serves `/healthcheck` and the
//! authenticated render endpoint until SIGINT or SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pdf_service::auth::OidcValidator;
use pdf_service::config::Config;
use pdf_service::render::SandboxRenderer;
use pdf_service::routes;
use pdf_service::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("Invalid configuration")?;

    tracing::info!(
        service = config.server.service_name.as_deref().unwrap_or("pdf-service"),
        "Starting PDF Service v{}",
        env!("CARGO_PKG_VERSION")
    );
    tracing::info!("Issuer: {}", config.auth.authority);
    tracing::info!("Audience: {}", config.auth.audience);

    // Signing keys are fetched once and never refreshed
    let http = reqwest::Client::new();
    let validator = OidcValidator::discover(
        &config.auth.authority,
        &config.auth.audience,
        &config.auth.required_scope,
        &http,
    )
    .await
    .context("Failed to initialize token validator")?;
    tracing::info!("Loaded {} signing keys", validator.key_count());

    let renderer = SandboxRenderer::new(config.sandbox.clone());
    tracing::info!(
        bwrap = %config.sandbox.bwrap_path.display(),
        weasyprint = %config.sandbox.weasyprint_path.display(),
        stylesheet = %config.sandbox.default_stylesheet_path.display(),
        "Renderer configured"
    );

    let app_state = AppState::new(
        config.limits.clone(),
        Arc::new(validator),
        Arc::new(renderer),
    );
    let app = routes::router(app_state);

    // Start server with graceful shutdown
    let bind_addr = (config.server.host.as_str(), config.server.port);
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.server.host, config.server.port))?;
    let addr: SocketAddr = listener.local_addr()?;
    tracing::info!("PDF Service listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
