use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{middleware, Router};
use reqwest::Client;
use tracing::info;

use crate::config::service::ServiceConfig;
use crate::config::settings::SettingsConfig;
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;
use crate::server::{routes, static_files};
use crate::service::VehicleService;
use crate::sources::oauth2::OAuth2TokenProvider;

#[derive(Clone)]
pub struct AppState {
    pub vehicle_service: VehicleService,
    pub token_provider: OAuth2TokenProvider,
    pub static_dir: Arc<PathBuf>,
    pub metrics_state: MetricsState,
}

impl AppState {
    pub fn new(cfg: &ServiceConfig, client: &Client, metrics: &Metrics) -> Self {
        Self {
            vehicle_service: VehicleService::from_config(cfg, client),
            token_provider: OAuth2TokenProvider::new(&cfg.auth, cfg.settings.sandbox, client.clone()),
            static_dir: Arc::new(PathBuf::from(&cfg.settings.static_dir)),
            metrics_state: MetricsState::new(metrics.registry.clone()),
        }
    }
}

/// Vehicle API, metrics and static files, all answering with `Access-Control-Allow-Origin: *`.
pub fn router(state: AppState, settings: &SettingsConfig) -> Router {
    Router::new()
        .merge(state.metrics_state.router(&settings.metrics))
        .merge(routes::router())
        .fallback(static_files::serve_static)
        .layer(middleware::map_response(routes::allow_any_origin))
        .with_state(state)
}

/// Serves until Ctrl-C or SIGTERM.
pub async fn start(cfg: &ServiceConfig, client: &Client) -> Result<()> {
    let metrics = get_metrics().await;
    let state = AppState::new(cfg, client, metrics);
    let app = router(state, &cfg.settings);

    let bind_addr = format!("{}:{}", cfg.settings.server.host, cfg.settings.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Server started on {}", bind_addr);

    metrics.up.set(1);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failed")?;
    metrics.up.set(0);

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
