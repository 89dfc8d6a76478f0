use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::cache::signed_token::SignedToken;
use crate::helpers::time::now_i64;
use crate::observability::metrics::get_metrics;
use crate::token::provider::ProviderToken;

/// Wait before retrying after a failed signing.
pub const RETRY_AFTER_FAILURE: Duration = Duration::from_secs(5);

/// Keep the cache of `token` warm: re-sign `margin` before the cached token
/// would go stale, so request paths only ever read the cache.
pub fn spawn_refresher(token: Arc<ProviderToken>, margin: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let sleep_for = refresh_once(&token, margin).await;
            debug!("token '{}': next refresh check in {:?}", token, sleep_for);
            tokio::time::sleep(sleep_for).await;
        }
    })
}

/// One refresher tick; returns how long to sleep before the next one.
pub async fn refresh_once(token: &ProviderToken, margin: Duration) -> Duration {
    let metrics = get_metrics().await;
    let refresh_after = token.refresh_interval();

    let due = token
        .cached()
        .map(|cached| now_i64() >= refresh_due_at(&cached, refresh_after, margin))
        .unwrap_or(true);

    if due {
        match token.refresh() {
            Ok(_) => {
                metrics.token_signings.inc();
                if let Some(cached) = token.cached() {
                    metrics.token_issued_at.set(cached.issued_at);
                    info!(
                        "token '{}' signed, issued at {}",
                        token,
                        DateTime::from_timestamp(cached.issued_at, 0)
                            .map(|t| t.to_rfc3339())
                            .unwrap_or_default()
                    );
                }
            }
            Err(err) => {
                metrics.token_sign_failures.with_label_values(&[error_kind(&err)]).inc();
                error!("token '{}' refresh failed: {}", token, err);
                return RETRY_AFTER_FAILURE;
            }
        }
    }

    token
        .cached()
        .map(|cached| {
            let wait = refresh_due_at(&cached, refresh_after, margin) - now_i64();
            Duration::from_secs(wait.max(1) as u64)
        })
        .unwrap_or(RETRY_AFTER_FAILURE)
}

fn refresh_due_at(cached: &SignedToken, refresh_after: Duration, margin: Duration) -> i64 {
    cached.refresh_at(refresh_after) - margin.as_secs() as i64
}

/// Short label for metrics.
pub fn error_kind(err: &crate::token::error::TokenError) -> &'static str {
    use crate::token::error::TokenError::*;
    match err {
        BadTeamIdentifier(_) | BadKeyIdentifier(_) => "identifier",
        NoPrivateKey => "no_private_key",
        KeySourceUnreadable { .. } => "key_unreadable",
        MalformedEnvelope(_) | WrongKeyFamily(_) | CorruptKey(_) => "key_invalid",
        Signing(_) => "signing",
        Decode(_) | Encode(_) => "codec",
        Verify(_) => "verify",
    }
}
