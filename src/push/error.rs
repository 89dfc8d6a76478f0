use thiserror::Error;

use crate::token::error::TokenError;

/// Gateway reasons that mean the provider token itself was refused.
pub const TOKEN_REJECTION_REASONS: [&str; 2] = ["ExpiredProviderToken", "InvalidProviderToken"];

#[derive(Debug, Error)]
pub enum PushError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("invalid notification: {0}")]
    InvalidNotification(String),

    #[error("push transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx answer from the gateway.
    #[error("push rejected with status {status}: {reason}")]
    Rejected {
        status: u16,
        reason: String,
        /// Milliseconds since epoch at which the device token became invalid (410 only).
        timestamp: Option<i64>,
        apns_id: Option<String>,
    },
}

impl PushError {
    /// The gateway refused the bearer token; a fresh signature may fix it.
    pub fn is_token_rejection(&self) -> bool {
        matches!(
            self,
            PushError::Rejected { status: 403, reason, .. } if TOKEN_REJECTION_REASONS.contains(&reason.as_str())
        )
    }

    /// Short label for metrics.
    pub fn reason(&self) -> &str {
        match self {
            PushError::Token(_) => "token",
            PushError::InvalidNotification(_) => "invalid_notification",
            PushError::Transport(_) => "transport",
            PushError::Rejected { reason, .. } => reason,
        }
    }
}
