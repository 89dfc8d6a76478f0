//! Key sources
//!
//! Every origin of private key material implements one narrow operation,
//! "produce raw key bytes". Parsing happens afterwards in
//! `token::key`, independent of where the bytes came from.

use std::future::Future;
use std::path::PathBuf;
use std::{env, fmt};

use serde::Deserialize;

use crate::token::error::TokenError;

pub trait KeySource {
    /// Human readable origin, used in error messages.
    fn origin(&self) -> String;

    fn read_key_bytes(&self) -> impl Future<Output = Result<Vec<u8>, TokenError>> + Send;
}

/// `.p8` file on disk.
#[derive(Debug, Clone)]
pub struct FileKeySource {
    pub path: PathBuf,
}

impl FileKeySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl KeySource for FileKeySource {
    fn origin(&self) -> String {
        format!("file '{}'", self.path.display())
    }

    async fn read_key_bytes(&self) -> Result<Vec<u8>, TokenError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| unreadable(self, e))
    }
}

/// PEM text held in an environment variable. Escaped `\n` sequences are
/// turned into newlines, since multi-line values rarely survive env files.
#[derive(Debug, Clone)]
pub struct EnvKeySource {
    pub var: String,
}

impl EnvKeySource {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl KeySource for EnvKeySource {
    fn origin(&self) -> String {
        format!("env '{}'", self.var)
    }

    async fn read_key_bytes(&self) -> Result<Vec<u8>, TokenError> {
        env::var(&self.var)
            .map(|value| value.replace("\\n", "\n").into_bytes())
            .map_err(|e| unreadable(self, e))
    }
}

/// Key bytes already in memory.
#[derive(Clone)]
pub struct InlineKeySource {
    pub bytes: Vec<u8>,
}

impl InlineKeySource {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self { bytes: bytes.into() }
    }
}

impl fmt::Debug for InlineKeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InlineKeySource")
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl KeySource for InlineKeySource {
    fn origin(&self) -> String {
        "inline value".to_owned()
    }

    async fn read_key_bytes(&self) -> Result<Vec<u8>, TokenError> {
        Ok(self.bytes.clone())
    }
}

/// ================================
/// Config
/// ================================
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum KeySourceConfig {
    Path { path: PathBuf },
    FromEnv { from_env: String },
    Value { value: String },
}

impl KeySource for KeySourceConfig {
    fn origin(&self) -> String {
        match self {
            KeySourceConfig::Path { path } => FileKeySource::new(path.clone()).origin(),
            KeySourceConfig::FromEnv { from_env } => EnvKeySource::new(from_env.clone()).origin(),
            KeySourceConfig::Value { .. } => "inline value".to_owned(),
        }
    }

    async fn read_key_bytes(&self) -> Result<Vec<u8>, TokenError> {
        match self {
            KeySourceConfig::Path { path } => FileKeySource::new(path.clone()).read_key_bytes().await,
            KeySourceConfig::FromEnv { from_env } => EnvKeySource::new(from_env.clone()).read_key_bytes().await,
            KeySourceConfig::Value { value } => InlineKeySource::new(value.as_bytes()).read_key_bytes().await,
        }
    }
}

fn unreadable(source: &impl KeySource, reason: impl fmt::Display) -> TokenError {
    TokenError::KeySourceUnreadable {
        origin: source.origin(),
        reason: reason.to_string(),
    }
}
