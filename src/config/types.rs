use serde::Deserialize;
use std::time::Duration;

use crate::config::gateway::GatewayConfig;
use crate::config::settings::SettingsConfig;
use crate::config::sinks::SinksConfig;
use crate::sources::KeySourceConfig;
use crate::token::{ProviderToken, TokenError};

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    pub provider: ProviderConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub sinks: SinksConfig,
}

/// ================================
/// Provider token
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    pub team_id: String,
    pub key_id: String,
    pub private_key: Option<KeySourceConfig>,
}

impl ProviderConfig {
    /// Construct the provider token and load its key, if one is configured.
    pub async fn build(&self, refresh_after: Duration) -> Result<ProviderToken, TokenError> {
        let token = ProviderToken::new(self.team_id.clone(), self.key_id.clone())?.refresh_after(refresh_after);
        if let Some(source) = &self.private_key {
            token.load_private_key(source).await?;
        }
        Ok(token)
    }
}

impl ServiceConfig {
    pub fn refresh_after(&self) -> Duration {
        Duration::from_secs(self.settings.refresh_after_seconds)
    }

    pub fn refresh_margin(&self) -> Duration {
        Duration::from_secs(self.settings.refresh_margin_seconds)
    }
}
