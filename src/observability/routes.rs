use std::sync::Arc;

use crate::config::settings::MetricsConfig;
use crate::server::server::AppState;
use axum::routing::get;
use axum::{extract::State, response::IntoResponse, Router};
use http::{header::CONTENT_TYPE, StatusCode};
use prometheus::{Encoder, Registry, TextEncoder};

#[derive(Clone)]
pub struct MetricsState {
    pub registry: Arc<Registry>,
}

impl MetricsState {
    pub fn new (registry: Registry) -> Self {
        Self {
            registry: Arc::new(registry)
        }
    }
}

impl MetricsState {
    pub fn router(&self, metrics_config: &MetricsConfig) -> Router<AppState> {
        let mut router = Router::new();
        if metrics_config.is_enabled {
            router = router.route(metrics_config.path.as_str(), get(serve_metrics));
        }
        router
    }
}

async fn serve_metrics(State(state): State<AppState>) -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = state.metrics_state.registry.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(CONTENT_TYPE, "text/plain")],
            format!("failed to encode metrics: {}", e),
        );
    }

    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        String::from_utf8_lossy(&buffer).into_owned(),
    )
}

#[cfg(test)]
mod tests {
    use crate::config::settings::SettingsConfig;
    use crate::config::sinks::SinksConfig;
    use crate::observability::metrics::get_metrics;
    use crate::server::server::{router, AppState};
    use crate::tests::common::{build_reqwest_client, loaded_token, spawn_axum};
    use http::StatusCode;
    use std::sync::Arc;

    #[tokio::test]
    async fn exposes_registry_when_enabled() -> anyhow::Result<()> {
        let mut settings = SettingsConfig::default();
        settings.metrics.is_enabled = true;

        let metrics = get_metrics().await;
        metrics.token_signings.inc();
        let state = AppState::new(metrics, Arc::new(loaded_token()));
        let (handle, addr) = spawn_axum(router(&settings, &SinksConfig::default(), state)).await;

        let res = build_reqwest_client()
            .get(format!("http://{}/metrics", addr))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::OK);
        let body = res.text().await?;
        assert!(body.contains("pushtoken_token_signings_total"));

        handle.abort();
        Ok(())
    }

    #[tokio::test]
    async fn hidden_when_disabled() -> anyhow::Result<()> {
        let state = AppState::new(get_metrics().await, Arc::new(loaded_token()));
        let (handle, addr) = spawn_axum(router(&SettingsConfig::default(), &SinksConfig::default(), state)).await;

        let res = build_reqwest_client()
            .get(format!("http://{}/metrics", addr))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        handle.abort();
        Ok(())
    }
}
