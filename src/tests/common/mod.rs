// tests/common/mod.rs
pub use axum::Router;
pub use tokio::task::JoinHandle;

use std::net::SocketAddr;
use reqwest::Client;

use crate::token::{PrivateKey, ProviderToken};

pub const TEAM_ID: &str = "W23G28NPJW";
pub const KEY_ID: &str = "67XV3VSJ95";

pub const P256_PEM: &str = include_str!("../fixtures/AuthKey_67XV3VSJ95.p8");
pub const OTHER_P256_PEM: &str = include_str!("../fixtures/AuthKey_other.p8");
pub const P384_PEM: &str = include_str!("../fixtures/p384.p8");
pub const ED25519_PEM: &str = include_str!("../fixtures/ed25519.p8");
pub const SEC1_PEM: &str = include_str!("../fixtures/sec1.pem");

pub fn test_key() -> PrivateKey {
    PrivateKey::from_pem(P256_PEM.as_bytes()).expect("fixture key")
}

pub fn other_key() -> PrivateKey {
    PrivateKey::from_pem(OTHER_P256_PEM.as_bytes()).expect("fixture key")
}

/// `W23G28NPJW:67XV3VSJ95` with the fixture key loaded.
pub fn loaded_token() -> ProviderToken {
    let token = ProviderToken::new(TEAM_ID, KEY_ID).expect("valid identifiers");
    token.install_key(test_key());
    token
}

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}
