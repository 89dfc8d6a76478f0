use std::sync::Arc;
use std::time::Duration;

use http::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::gateway::GatewayConfig;
use crate::helpers::time::get_instant;
use crate::observability::metrics::get_metrics;
use crate::push::error::PushError;
use crate::push::notification::Notification;
use crate::push::response::{parse_response, PushResponse};
use crate::token::ProviderToken;

/// Sends notifications to the push gateway, authorized by a shared provider token.
///
/// Clone freely: the HTTP connection pool and the token are shared.
#[derive(Debug, Clone)]
pub struct PushClient {
    http: Client,
    base_url: String,
    token: Arc<ProviderToken>,
}

impl PushClient {
    pub fn new(token: Arc<ProviderToken>, gateway: &GatewayConfig) -> Result<Self, PushError> {
        let http = Client::builder()
            .timeout(Duration::from_millis(gateway.timeout_ms))
            .pool_idle_timeout(None)
            .build()?;
        Ok(Self::with_client(http, token, gateway))
    }

    /// Reuse an existing reqwest client (and its connection pool).
    pub fn with_client(http: Client, token: Arc<ProviderToken>, gateway: &GatewayConfig) -> Self {
        Self {
            http,
            base_url: gateway.base_url(),
            token,
        }
    }

    /// Send one notification.
    ///
    /// If the gateway refuses the bearer token (`ExpiredProviderToken`,
    /// `InvalidProviderToken`) the token is re-signed and the request is sent
    /// once more.
    pub async fn push(&self, notification: &Notification) -> Result<PushResponse, PushError> {
        let metrics = get_metrics().await;
        let start = get_instant();
        let topic = notification.topic.as_deref().unwrap_or("none");

        let bearer = self.token.signed_token()?;
        let result = match self.send(notification, &bearer).await {
            Err(err) if err.is_token_rejection() => {
                warn!("token '{}' rejected by gateway ({}), re-signing", self.token, err.reason());
                metrics.token_forced_refreshes.inc();
                let bearer = self.token.refresh()?;
                self.send(notification, &bearer).await
            }
            other => other,
        };

        metrics
            .push_duration
            .with_label_values(&[topic])
            .observe(start.elapsed().as_secs_f64());

        match &result {
            Ok(response) => {
                let status = response.status.to_string();
                metrics.push_requests.with_label_values(&[status.as_str()]).inc();
                info!(
                    "push to '{}' accepted, apns-id: {}",
                    notification.device_token,
                    response.apns_id.as_deref().unwrap_or("-")
                );
            }
            Err(err) => {
                if let PushError::Rejected { status, .. } = err {
                    let status = status.to_string();
                    metrics.push_requests.with_label_values(&[status.as_str()]).inc();
                }
                metrics.push_failures.with_label_values(&[err.reason()]).inc();
                warn!("push to '{}' failed: {}", notification.device_token, err);
            }
        }
        result
    }

    async fn send(&self, notification: &Notification, bearer: &str) -> Result<PushResponse, PushError> {
        let url = format!("{}{}", self.base_url, notification.path()?);
        debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .headers(notification.headers()?)
            .header(AUTHORIZATION, format!("bearer {}", bearer))
            .header(CONTENT_TYPE, "application/json")
            .body(notification.payload.clone())
            .send()
            .await?;

        parse_response(response).await
    }
}
