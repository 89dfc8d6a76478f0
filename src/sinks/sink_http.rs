use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::config::sinks::SinksConfig;
use crate::server::server::AppState;
use crate::token::{ProviderToken, TokenError};

/// Serves the provider token to local consumers that do not sign themselves.
#[derive(Clone)]
pub struct TokenSinkState {
    token: Arc<ProviderToken>,
}

#[derive(Debug, Serialize)]
pub struct TokenSinkResponse {
    pub token: String,
    pub issued_at: i64,
    pub team_id: String,
    pub key_id: String,
}

impl TokenSinkState {
    pub fn new(token: Arc<ProviderToken>) -> Self {
        Self { token }
    }

    pub fn router(&self, sinks: &SinksConfig) -> Router<AppState> {
        let mut router = Router::new();
        if let Some(token_sink) = &sinks.token {
            info!("served path: {}", &token_sink.path);
            router = router.route(&token_sink.path, get(handle_token_request));
        }
        router
    }

    /// Current token; signs through the cache like any other request path.
    pub fn current(&self) -> Result<TokenSinkResponse, TokenError> {
        let token = self.token.signed_token()?;
        let issued_at = self
            .token
            .cached()
            .filter(|cached| cached.value == token)
            .map(|cached| cached.issued_at)
            .unwrap_or_default();

        Ok(TokenSinkResponse {
            token,
            issued_at,
            team_id: self.token.team_id().to_owned(),
            key_id: self.token.key_id().to_owned(),
        })
    }
}

async fn handle_token_request(State(state): State<AppState>) -> Response {
    match state.token_sink_state.current() {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => {
            warn!("token sink: {}", err);
            let status = if err.is_missing_key() {
                StatusCode::SERVICE_UNAVAILABLE
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, Json(json!({ "error": err.to_string() }))).into_response()
        }
    }
}
