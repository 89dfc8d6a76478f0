//! Shared constants

pub const DEFAULT_CONFIG_PATH: &str = "push-token-agent.yaml";
