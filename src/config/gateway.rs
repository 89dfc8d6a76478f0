use serde::Deserialize;

pub const PRODUCTION_URL: &str = "https://api.push.apple.com";
pub const DEVELOPMENT_URL: &str = "https://api.sandbox.push.apple.com";

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GatewayEnvironment {
    #[default]
    Production,
    Development,
}

/// ================================
/// Push gateway
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    #[serde(default)]
    pub environment: GatewayEnvironment,
    /// overrides `environment` when set
    pub url: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            environment: GatewayEnvironment::default(),
            url: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl GatewayConfig {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> String {
        let url = match (&self.url, self.environment) {
            (Some(url), _) => url.as_str(),
            (None, GatewayEnvironment::Production) => PRODUCTION_URL,
            (None, GatewayEnvironment::Development) => DEVELOPMENT_URL,
        };
        url.trim_end_matches('/').to_owned()
    }
}

fn default_timeout_ms() -> u64 {
    5000
}
