use reqwest::Response;
use serde::{Deserialize, Serialize};

use crate::push::error::PushError;

pub const APNS_ID_HEADER: &str = "apns-id";

/// Successful delivery acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushResponse {
    pub status: u16,
    pub apns_id: Option<String>,
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    reason: String,
    #[serde(default)]
    timestamp: Option<i64>,
}

/// Turn a gateway response into a result.
pub async fn parse_response(response: Response) -> Result<PushResponse, PushError> {
    let status = response.status().as_u16();
    let apns_id = response
        .headers()
        .get(APNS_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    if response.status().is_success() {
        return Ok(PushResponse { status, apns_id });
    }

    let body = response.text().await?;
    let (reason, timestamp) = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(err) => (err.reason, err.timestamp),
        Err(_) if body.trim().is_empty() => (format!("HTTP {}", status), None),
        Err(_) => (body.trim().to_owned(), None),
    };

    Err(PushError::Rejected {
        status,
        reason,
        timestamp,
        apns_id,
    })
}
