use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use p256::ecdsa::VerifyingKey;

use crate::cache::signed_token::SignedToken;
use crate::helpers::time::now_i64;
use crate::sources::KeySource;
use crate::token::error::TokenError;
use crate::token::identifier::validate_identifier;
use crate::token::jwt;
use crate::token::key::PrivateKey;

/// The gateway rejects tokens older than an hour; re-sign well before that.
pub const DEFAULT_REFRESH_AFTER: Duration = Duration::from_secs(55 * 60);

/// Everything mutable lives behind one lock: key replacement and signing
/// serialize against each other.
#[derive(Debug, Default)]
struct State {
    key: Option<PrivateKey>,
    cached: Option<SignedToken>,
    /// Survives invalidation and key replacement: every new signature is
    /// issued strictly later than the previous one.
    last_issued_at: Option<i64>,
}

/// Provider token: identifiers, signing key and the cached signed token.
///
/// Share it between request paths with `Arc<ProviderToken>`; every method
/// takes `&self`.
#[derive(Debug)]
pub struct ProviderToken {
    team_id: String,
    key_id: String,
    refresh_after: Duration,
    state: Mutex<State>,
}

impl ProviderToken {
    /// Validates both identifiers; no token exists if either is rejected.
    pub fn new(team_id: impl Into<String>, key_id: impl Into<String>) -> Result<Self, TokenError> {
        let team_id = team_id.into();
        let key_id = key_id.into();
        validate_identifier(&team_id).map_err(TokenError::BadTeamIdentifier)?;
        validate_identifier(&key_id).map_err(TokenError::BadKeyIdentifier)?;

        Ok(Self {
            team_id,
            key_id,
            refresh_after: DEFAULT_REFRESH_AFTER,
            state: Mutex::new(State::default()),
        })
    }

    /// Override how long a signed token is reused.
    pub fn refresh_after(mut self, refresh_after: Duration) -> Self {
        self.refresh_after = refresh_after;
        self
    }

    pub fn team_id(&self) -> &str {
        &self.team_id
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_after
    }

    /// ================================
    /// Key store
    /// ================================

    /// Parse and install a PEM encoded PKCS#8 P-256 key.
    pub fn set_private_key(&self, pem: &[u8]) -> Result<(), TokenError> {
        let key = PrivateKey::from_pem(pem)?;
        self.install_key(key);
        Ok(())
    }

    /// Read key bytes from `source`, then parse and install them.
    ///
    /// The lock is only taken after the read completes.
    pub async fn load_private_key<S: KeySource>(&self, source: &S) -> Result<(), TokenError> {
        let bytes = source.read_key_bytes().await?;
        self.set_private_key(&bytes)
    }

    /// Replace the key; a token signed by the previous key is dropped.
    pub fn install_key(&self, key: PrivateKey) {
        let mut state = self.lock();
        state.key = Some(key);
        state.cached = None;
    }

    pub fn has_private_key(&self) -> bool {
        self.lock().key.is_some()
    }

    /// PKCS#8 PEM of the held key.
    pub fn export_private_key(&self) -> Result<String, TokenError> {
        self.lock()
            .key
            .as_ref()
            .ok_or(TokenError::NoPrivateKey)?
            .to_pem()
    }

    pub(crate) fn export_private_key_der(&self) -> Result<Vec<u8>, TokenError> {
        self.lock()
            .key
            .as_ref()
            .ok_or(TokenError::NoPrivateKey)?
            .to_pkcs8_der()
    }

    pub fn public_key_pem(&self) -> Result<String, TokenError> {
        self.lock()
            .key
            .as_ref()
            .ok_or(TokenError::NoPrivateKey)?
            .public_key_pem()
    }

    pub fn verifying_key(&self) -> Result<VerifyingKey, TokenError> {
        self.lock()
            .key
            .as_ref()
            .map(|key| key.verifying_key().clone())
            .ok_or(TokenError::NoPrivateKey)
    }

    /// Check a bearer token against this token's public key and identifiers.
    pub fn verify(&self, token: &str) -> Result<jwt::VerifiedToken, TokenError> {
        let key = self.verifying_key()?;
        jwt::verify_identity(token, &key, &self.key_id, &self.team_id)
            .map_err(|e| TokenError::Verify(e.to_string()))
    }

    /// ================================
    /// Signing
    /// ================================

    /// Current bearer token: the cached one while fresh, otherwise a new one.
    pub fn signed_token(&self) -> Result<String, TokenError> {
        self.issue(false)
    }

    /// Force a new signature, bypassing the cache.
    pub fn refresh(&self) -> Result<String, TokenError> {
        self.issue(true)
    }

    /// Drop the cached token; the next [`signed_token`](Self::signed_token) re-signs.
    pub fn invalidate(&self) {
        self.lock().cached = None;
    }

    fn issue(&self, force: bool) -> Result<String, TokenError> {
        let mut state = self.lock();
        let key = state.key.as_ref().ok_or(TokenError::NoPrivateKey)?;

        if !force {
            if let Some(cached) = state.cached.as_ref().filter(|t| t.is_fresh(self.refresh_after)) {
                return Ok(cached.value.clone());
            }
        }

        let issued_at = match state.last_issued_at {
            Some(last) => now_i64().max(last + 1),
            None => now_i64(),
        };
        let value = jwt::sign(key, &self.key_id, &self.team_id, issued_at)?;
        state.last_issued_at = Some(issued_at);
        state.cached = Some(SignedToken::new(value.clone(), issued_at));
        Ok(value)
    }

    /// Snapshot of the cached token, fresh or not.
    pub fn cached(&self) -> Option<SignedToken> {
        self.lock().cached.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // no operation leaves State half-updated, so a poisoned lock is still usable
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Display for ProviderToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.team_id, self.key_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::common::{loaded_token, KEY_ID, OTHER_P256_PEM, P256_PEM, TEAM_ID};
    use crate::token::error::IdentifierError;
    use crate::token::jwt::decode_unverified;

    #[test]
    fn display_is_team_colon_key() {
        let token = ProviderToken::new(TEAM_ID, KEY_ID).unwrap();
        assert_eq!(token.to_string(), "W23G28NPJW:67XV3VSJ95");
        assert_eq!(token.team_id(), TEAM_ID);
        assert_eq!(token.key_id(), KEY_ID);
    }

    #[test]
    fn bad_identifiers_are_rejected_at_construction() {
        let err = ProviderToken::new("W23G28NPJ", KEY_ID).unwrap_err();
        assert!(matches!(
            err,
            TokenError::BadTeamIdentifier(IdentifierError::WrongLength { actual: 9, .. })
        ));

        let err = ProviderToken::new(TEAM_ID, "67XV3VSJ9").unwrap_err();
        assert!(matches!(err, TokenError::BadKeyIdentifier(IdentifierError::WrongLength { .. })));

        let err = ProviderToken::new(TEAM_ID, "67xv3vsj95").unwrap_err();
        assert!(matches!(
            err,
            TokenError::BadKeyIdentifier(IdentifierError::DisallowedCharacter { .. })
        ));
    }

    #[test]
    fn signing_without_key_fails() {
        let token = ProviderToken::new(TEAM_ID, KEY_ID).unwrap();
        assert!(token.signed_token().unwrap_err().is_missing_key());
        assert!(matches!(token.refresh(), Err(TokenError::NoPrivateKey)));
        assert!(matches!(token.export_private_key(), Err(TokenError::NoPrivateKey)));
        assert!(token.cached().is_none());
    }

    #[test]
    fn failed_key_load_keeps_state() {
        let token = ProviderToken::new(TEAM_ID, KEY_ID).unwrap();
        assert!(token.set_private_key(b"private key").is_err());
        assert!(!token.has_private_key());

        let token = loaded_token();
        let before = token.export_private_key().unwrap();
        assert!(token.set_private_key(b"private key").is_err());
        assert_eq!(token.export_private_key().unwrap(), before);
    }

    #[test]
    fn cached_token_is_reused() {
        let token = loaded_token();
        let first = token.signed_token().unwrap();
        let second = token.signed_token().unwrap();
        assert_eq!(first, second);

        let cached = token.cached().unwrap();
        assert_eq!(cached.value, first);
        let (_, claims) = decode_unverified(&first).unwrap();
        assert_eq!(claims.iat, cached.issued_at);
    }

    #[test]
    fn replacing_key_drops_cached_token() {
        let token = loaded_token();
        let first = token.signed_token().unwrap();

        token.set_private_key(OTHER_P256_PEM.as_bytes()).unwrap();
        assert!(token.cached().is_none());

        let second = token.signed_token().unwrap();
        assert_ne!(first, second);
        assert!(token.verify(&second).is_ok());
        assert!(token.verify(&first).is_err());
    }

    #[test]
    fn forced_regeneration_advances_issue_time() {
        let token = loaded_token();
        let first = token.signed_token().unwrap();
        let (_, a) = decode_unverified(&first).unwrap();

        token.invalidate();
        let second = token.signed_token().unwrap();
        let (_, b) = decode_unverified(&second).unwrap();

        let third = token.refresh().unwrap();
        let (_, c) = decode_unverified(&third).unwrap();

        assert!(b.iat > a.iat);
        assert!(c.iat > b.iat);
        assert_ne!(first, second);
        assert_ne!(second, third);
        assert_eq!(token.cached().unwrap().issued_at, c.iat);
        assert!(token.verify(&third).is_ok());
    }

    #[test]
    fn key_replacement_does_not_reuse_issue_time() {
        let token = loaded_token();
        let (_, a) = decode_unverified(&token.signed_token().unwrap()).unwrap();

        token.set_private_key(OTHER_P256_PEM.as_bytes()).unwrap();
        let (_, b) = decode_unverified(&token.signed_token().unwrap()).unwrap();
        assert!(b.iat > a.iat);
    }

    #[test]
    fn verify_reports_mismatches_as_verify_errors() {
        let token = loaded_token();
        let other = ProviderToken::new("AAAAAAAAAA", KEY_ID).unwrap();
        other.install_key(crate::tests::common::test_key());

        // same key, different issuer
        let foreign = other.signed_token().unwrap();
        assert!(matches!(token.verify(&foreign), Err(TokenError::Verify(_))));
        assert!(matches!(token.verify("not a token"), Err(TokenError::Verify(_))));
    }

    #[test]
    fn refresh_replaces_cache_entry() {
        let token = ProviderToken::new(TEAM_ID, KEY_ID)
            .unwrap()
            .refresh_after(Duration::ZERO);
        token.set_private_key(P256_PEM.as_bytes()).unwrap();

        let refreshed = token.refresh().unwrap();
        let cached = token.cached().unwrap();
        assert_eq!(cached.value, refreshed);
        assert!(token.verify(&refreshed).is_ok());
    }
}
