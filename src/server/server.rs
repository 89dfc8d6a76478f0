use std::sync::Arc;
use anyhow::Result;
use axum::Router;
use tracing::info;
use crate::config::settings::SettingsConfig;
use crate::config::sinks::SinksConfig;
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;
use crate::sinks::sink_http::TokenSinkState;
use crate::token::ProviderToken;

#[derive(Clone)]
pub struct AppState {
    pub metrics_state: MetricsState,
    pub token_sink_state: TokenSinkState,
}

impl AppState {
    pub fn new (
        metrics: &Metrics,
        token: Arc<ProviderToken>,
    ) -> Self {
        Self {
            metrics_state: MetricsState::new(metrics.registry.clone()),
            token_sink_state: TokenSinkState::new(token),
        }
    }
}

/// Build the router serving the metrics path and the configured sinks.
pub fn router(
    settings_config: &SettingsConfig,
    sinks: &SinksConfig,
    state: AppState,
) -> Router {
    Router::new()
        .merge(state.metrics_state.router(&settings_config.metrics))
        .merge(state.token_sink_state.router(sinks))
        .with_state(state)
}

/// Start one Axum server for metrics and the token sink; returns immediately
/// when nothing is configured to be served.
pub async fn start(
    settings_config: &SettingsConfig,
    sinks: &SinksConfig,
    token: Arc<ProviderToken>,
) -> Result<()> {
    let metrics = get_metrics().await;
    let state = AppState::new(metrics, token);
    let app = router(settings_config, sinks, state);

    if app.has_routes() {
        let bind_addr = &settings_config.server.host;
        let port = &settings_config.server.port;
        let listener = tokio::net::TcpListener::bind(format!("{}:{}", bind_addr, port)).await?;
        info!("http server listening on {}:{}", bind_addr, port);
        metrics.up.set(1);
        axum::serve(listener, app).await?;
    }

    Ok(())
}
