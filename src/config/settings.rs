use serde::Deserialize;

use crate::token::DEFAULT_REFRESH_AFTER;

/// ================================
/// Global service-wide settings
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct SettingsConfig {
    /// reuse a signed token for this long before re-signing
    #[serde(default = "default_refresh_after_seconds")]
    pub refresh_after_seconds: u64,
    /// the refresher re-signs this long before `refresh_after_seconds` elapses
    #[serde(default = "default_refresh_margin_seconds")]
    pub refresh_margin_seconds: u64,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub logging: Option<LoggingConfig>
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            refresh_after_seconds: default_refresh_after_seconds(),
            refresh_margin_seconds: default_refresh_margin_seconds(),
            metrics: MetricsConfig::default(),
            server: ServerConfig::default(),
            logging: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_path")]
    pub path: String,
    #[serde(default)]
    pub is_enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { path: default_metrics_path(), is_enabled: false }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: String
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new (level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT")
            .unwrap_or_else(|_| "json".to_string())
            .to_lowercase()
            .as_str()
        {
            "compact" | "text" => LogFormat::Compact,
            _ => LogFormat::Json,
        }
    }
}

fn default_refresh_after_seconds() -> u64 {
    DEFAULT_REFRESH_AFTER.as_secs()
}

fn default_refresh_margin_seconds() -> u64 {
    60
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> String {
    "8080".to_string()
}
