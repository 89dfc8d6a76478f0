use serde::{Deserialize, Serialize};

/// ================================
/// Sinks
/// ================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SinksConfig {
    /// serve the current bearer token over HTTP
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<TokenSinkConfig>,
}

/// HTTP sink exposing the provider token to local consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSinkConfig {
    /// Relative URL path (e.g., `/token`).
    pub path: String,
}
