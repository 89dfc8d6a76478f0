//! # Push Token Library
//!
//! Issues provider tokens for a push notification gateway: short-lived
//! ES256 JWTs signed with a P-256 key, cached until they go stale and
//! attached as bearer tokens by the push client.
//!
//! Modules:
//! - `token` — identifiers, key parsing, JWT signing, the provider token
//! - `cache` — the signed token cache entry
//! - `sources` — file, env and inline key sources
//! - `push` — gateway client, notifications and error reasons
//! - `config` — YAML service configuration and validation
//! - `server`, `sinks`, `observability` — HTTP token sink and metrics

pub mod cache;
pub mod config;
pub mod helpers;
pub mod observability;
pub mod push;
pub mod server;
pub mod sinks;
pub mod sources;
pub mod token;
pub mod utils;

#[cfg(test)]
pub mod tests;

pub use crate::push::{Notification, PushClient, PushError};
pub use crate::token::{PrivateKey, ProviderToken, TokenError};
