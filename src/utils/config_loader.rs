use std::path::Path;
use anyhow::{Context, Result};

use crate::config::proc_loader::file_to_config;
use crate::config::types::ServiceConfig;

/// Load, expand and validate the service config at `config_path`.
pub async fn run(config_path: &str) -> Result<ServiceConfig> {
    file_to_config(Path::new(config_path))
        .await
        .with_context(|| format!("loading config '{}'", config_path))
}
