use clap::ValueEnum;
use http::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::push::error::PushError;

/// `apns-priority` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Deliver immediately.
    High,
    /// Deliver considering device power.
    Normal,
    /// Deliver at the device's convenience, may be grouped.
    Low,
}

impl Priority {
    pub fn as_header(&self) -> &'static str {
        match self {
            Priority::High => "10",
            Priority::Normal => "5",
            Priority::Low => "1",
        }
    }
}

/// `apns-push-type` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PushType {
    Alert,
    Background,
    Location,
    Voip,
    Complication,
    Fileprovider,
    Mdm,
    Liveactivity,
}

impl PushType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PushType::Alert => "alert",
            PushType::Background => "background",
            PushType::Location => "location",
            PushType::Voip => "voip",
            PushType::Complication => "complication",
            PushType::Fileprovider => "fileprovider",
            PushType::Mdm => "mdm",
            PushType::Liveactivity => "liveactivity",
        }
    }
}

/// A single notification for one device. The payload is sent as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub device_token: String,
    #[serde(default)]
    pub topic: Option<String>,
    /// Canonical UUID; the gateway generates one when absent.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub collapse_id: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    /// Unix seconds after which the gateway stops retrying delivery.
    #[serde(default)]
    pub expiration: Option<i64>,
    #[serde(default)]
    pub push_type: Option<PushType>,
    pub payload: String,
}

impl Notification {
    pub fn new(device_token: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            device_token: device_token.into(),
            payload: payload.into(),
            ..Default::default()
        }
    }

    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn collapse_id(mut self, collapse_id: impl Into<String>) -> Self {
        self.collapse_id = Some(collapse_id.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn expiration(mut self, unix_ts: i64) -> Self {
        self.expiration = Some(unix_ts);
        self
    }

    pub fn push_type(mut self, push_type: PushType) -> Self {
        self.push_type = Some(push_type);
        self
    }

    /// Request path on the gateway. Device tokens are hex strings; anything
    /// else could change the request target and is rejected.
    pub fn path(&self) -> Result<String, PushError> {
        if self.device_token.is_empty() || !self.device_token.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(PushError::InvalidNotification(format!(
                "device token '{}' is not a hex string",
                self.device_token
            )));
        }
        Ok(format!("/3/device/{}", self.device_token))
    }

    /// `apns-*` headers for this notification (authorization excluded).
    pub fn headers(&self) -> Result<HeaderMap, PushError> {
        let mut headers = HeaderMap::new();
        insert(&mut headers, "apns-topic", self.topic.as_deref())?;
        insert(&mut headers, "apns-id", self.id.as_deref())?;
        insert(&mut headers, "apns-collapse-id", self.collapse_id.as_deref())?;
        insert(&mut headers, "apns-priority", self.priority.map(|p| p.as_header()))?;
        insert(&mut headers, "apns-expiration", self.expiration.map(|e| e.to_string()).as_deref())?;
        insert(&mut headers, "apns-push-type", self.push_type.map(|t| t.as_str()))?;
        Ok(headers)
    }
}

fn insert(headers: &mut HeaderMap, name: &'static str, value: Option<&str>) -> Result<(), PushError> {
    if let Some(value) = value {
        let value = HeaderValue::from_str(value)
            .map_err(|_| PushError::InvalidNotification(format!("invalid value for '{}'", name)))?;
        headers.insert(HeaderName::from_static(name), value);
    }
    Ok(())
}
