//! Structured form of a provider token for storage or hand-over between
//! processes holding the same signing authority.
//!
//! The signed token cache is derived data and is never part of the record.

use serde::{Deserialize, Serialize, Serializer};

use crate::token::error::TokenError;
use crate::token::provider::ProviderToken;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderTokenRecord {
    pub team_identifier: String,
    pub key_identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_encoded: Option<String>,
}

impl ProviderToken {
    pub fn to_record(&self) -> Result<ProviderTokenRecord, TokenError> {
        let private_key_encoded = match self.export_private_key() {
            Ok(pem) => Some(pem),
            Err(TokenError::NoPrivateKey) => None,
            Err(e) => return Err(e),
        };
        Ok(ProviderTokenRecord {
            team_identifier: self.team_id().to_owned(),
            key_identifier: self.key_id().to_owned(),
            private_key_encoded,
        })
    }

    /// Same validation path as [`ProviderToken::new`] followed by key parsing.
    pub fn from_record(record: ProviderTokenRecord) -> Result<Self, TokenError> {
        let token = ProviderToken::new(record.team_identifier, record.key_identifier)?;
        if let Some(pem) = record.private_key_encoded {
            token.set_private_key(pem.as_bytes())?;
        }
        Ok(token)
    }

    pub fn to_json(&self) -> Result<String, TokenError> {
        serde_json::to_string(&self.to_record()?).map_err(|e| TokenError::Encode(e.to_string()))
    }

    /// Malformed JSON or an unexpected shape is `TokenError::Decode`; a
    /// well-formed record with bad fields fails like direct construction.
    pub fn from_json(json: &str) -> Result<Self, TokenError> {
        let record: ProviderTokenRecord =
            serde_json::from_str(json).map_err(|e| TokenError::Decode(e.to_string()))?;
        Self::from_record(record)
    }
}

impl Serialize for ProviderToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_record()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ProviderToken {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = ProviderTokenRecord::deserialize(deserializer)?;
        ProviderToken::from_record(record).map_err(serde::de::Error::custom)
    }
}
