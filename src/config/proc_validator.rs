//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Checks identifiers with the same rules the provider token applies
//! - Refresh window, gateway URL, HTTP paths and logging invariants

use std::collections::HashMap;
use tracing::{error, info};

use crate::config::gateway::GatewayConfig;
use crate::config::settings::SettingsConfig;
use crate::config::sinks::SinksConfig;
use crate::config::types::{ProviderConfig, ServiceConfig};
use crate::observability::metrics::get_metrics;
use crate::sources::KeySourceConfig;
use crate::token::identifier::validate_identifier;

/// The gateway refuses tokens older than this.
const GATEWAY_TOKEN_MAX_AGE_SECONDS: u64 = 60 * 60;

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub async fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);
    validate_provider(&cfg.provider, &mut errors);
    validate_gateway(&cfg.gateway, &mut errors);
    validate_sinks(&cfg.sinks, &cfg.settings, &mut errors);

    if errors.is_empty() {
        info!("config valid");
        Ok(())
    } else {
        error!("configuration validation errors ({}):", errors.len());
        for e in &errors {
            error!(" - {}", e);
        }
        get_metrics().await.config_validation_errors.inc();
        Err(errors)
    }
}

/// SETTINGS VALIDATION
fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if settings.refresh_after_seconds == 0 || settings.refresh_after_seconds >= GATEWAY_TOKEN_MAX_AGE_SECONDS {
        errors.push(format!(
            "settings.refresh_after_seconds ({}) must be in 1..{}",
            settings.refresh_after_seconds, GATEWAY_TOKEN_MAX_AGE_SECONDS
        ));
    }
    if settings.refresh_margin_seconds >= settings.refresh_after_seconds {
        errors.push(format!(
            "settings.refresh_margin_seconds ({}) must be < refresh_after_seconds ({})",
            settings.refresh_margin_seconds, settings.refresh_after_seconds
        ));
    }

    if settings.server.host.is_empty() {
        errors.push("settings.server.host must not be empty".to_string());
    }
    if settings.server.port.parse::<u16>().is_err() {
        errors.push(format!(
            "settings.server.port '{}' must be a valid port number",
            settings.server.port
        ));
    }

    // metrics endpoint start with '/'
    let metrics = &settings.metrics;
    if !metrics.path.starts_with('/') {
        errors.push(format!(
            "settings.metrics.path '{}' must start with '/'",
            metrics.path
        ));
    }

    // logging level
    if let Some(logging) = &settings.logging {
        let valid = ["trace", "debug", "info", "warn", "error"];
        if !valid.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' invalid; allowed: {:?}",
                logging.level, valid
            ));
        }
    }
}

/// PROVIDER VALIDATION
fn validate_provider(provider: &ProviderConfig, errors: &mut Vec<String>) {
    if let Err(e) = validate_identifier(&provider.team_id) {
        errors.push(format!("provider.team_id '{}': {}", provider.team_id, e));
    }
    if let Err(e) = validate_identifier(&provider.key_id) {
        errors.push(format!("provider.key_id '{}': {}", provider.key_id, e));
    }

    match &provider.private_key {
        Some(KeySourceConfig::Path { path }) if !path.is_absolute() => {
            errors.push(format!(
                "provider.private_key.path '{}' must be an absolute path",
                path.display()
            ));
        }
        Some(KeySourceConfig::FromEnv { from_env }) if from_env.trim().is_empty() => {
            errors.push("provider.private_key.from_env must name a variable".to_string());
        }
        Some(KeySourceConfig::Value { value }) if value.trim().is_empty() => {
            errors.push("provider.private_key.value must not be empty".to_string());
        }
        _ => {}
    }
}

/// GATEWAY VALIDATION
fn validate_gateway(gateway: &GatewayConfig, errors: &mut Vec<String>) {
    if let Some(url) = &gateway.url {
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            errors.push(format!("gateway.url '{}' must start with http:// or https://", url));
        }
    }
    if gateway.timeout_ms == 0 {
        errors.push("gateway.timeout_ms must be > 0".to_string());
    }
}

/// SINKS VALIDATION
fn validate_sinks(sinks: &SinksConfig, settings: &SettingsConfig, errors: &mut Vec<String>) {
    // path -> owner, collisions on the single HTTP server
    let mut http_paths: HashMap<String, &str> = HashMap::new();
    if settings.metrics.is_enabled {
        http_paths.insert(settings.metrics.path.clone(), "settings.metrics");
    }

    if let Some(token_sink) = &sinks.token {
        if !token_sink.path.starts_with('/') {
            errors.push(format!("sinks.token.path '{}' must start with '/'", token_sink.path));
        }
        if let Some(prev) = http_paths.insert(token_sink.path.clone(), "sinks.token") {
            errors.push(format!(
                "{} and sinks.token both define HTTP path '{}'; HTTP paths must be unique",
                prev, token_sink.path
            ));
        }
    }
}
