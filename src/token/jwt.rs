//! Compact ES256 JWS form of the provider token.
//!
//! Header `{"alg":"ES256","kid":..}`, claims `{"iss":..,"iat":..}`; encoding
//! and verification go through `jsonwebtoken`.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, Header, Validation};
use p256::ecdsa::VerifyingKey;
use p256::pkcs8::{EncodePublicKey, LineEnding};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::token::error::TokenError;
use crate::token::key::PrivateKey;

pub const ES256: Algorithm = Algorithm::ES256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub iss: String,
    pub iat: i64,
}

/// Header and claims of a token whose signature checked out.
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    pub header: Header,
    pub claims: JwtClaims,
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("unusable verifying key: {0}")]
    Key(String),
    #[error("signature does not match")]
    Signature,
    #[error("key id {0:?} does not match")]
    KeyId(Option<String>),
    #[error("issuer '{0}' does not match")]
    Issuer(String),
}

/// Sign `{"alg":"ES256","kid":key_id}.{"iss":team_id,"iat":issued_at}`.
pub fn sign(key: &PrivateKey, key_id: &str, team_id: &str, issued_at: i64) -> Result<String, TokenError> {
    let header = Header {
        typ: None,
        kid: Some(key_id.to_owned()),
        ..Header::new(ES256)
    };
    let claims = JwtClaims {
        iss: team_id.to_owned(),
        iat: issued_at,
    };

    encode(&header, &claims, &key.encoding_key()?).map_err(|e| TokenError::Signing(e.to_string()))
}

/// Check the ES256 signature of `token` against `key` and decode its parts.
///
/// Only the signature and algorithm are checked; see [`verify_identity`].
pub fn verify(token: &str, key: &VerifyingKey) -> Result<VerifiedToken, VerifyError> {
    let public_pem = key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| VerifyError::Key(e.to_string()))?;
    let decoding_key = DecodingKey::from_ec_pem(public_pem.as_bytes()).map_err(|e| VerifyError::Key(e.to_string()))?;

    let data = decode::<JwtClaims>(token, &decoding_key, &validation()).map_err(|e| match e.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => VerifyError::Signature,
        _ => VerifyError::Malformed(e.to_string()),
    })?;

    Ok(VerifiedToken {
        header: data.header,
        claims: data.claims,
    })
}

/// [`verify`], then require `kid` and `iss` to name the expected key and team.
pub fn verify_identity(
    token: &str,
    key: &VerifyingKey,
    key_id: &str,
    team_id: &str,
) -> Result<VerifiedToken, VerifyError> {
    let verified = verify(token, key)?;
    if verified.header.kid.as_deref() != Some(key_id) {
        return Err(VerifyError::KeyId(verified.header.kid));
    }
    if verified.claims.iss != team_id {
        return Err(VerifyError::Issuer(verified.claims.iss));
    }
    Ok(verified)
}

/// Decode header and claims without checking the signature.
pub fn decode_unverified(token: &str) -> Result<(Header, JwtClaims), VerifyError> {
    let mut validation = validation();
    validation.insecure_disable_signature_validation();

    decode::<JwtClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| (data.header, data.claims))
        .map_err(|e| VerifyError::Malformed(e.to_string()))
}

/// Provider tokens carry no `exp`; freshness is the issuer's concern.
fn validation() -> Validation {
    let mut validation = Validation::new(ES256);
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::common::{other_key, test_key};
    use base64::engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL;
    use base64::Engine;

    fn signed() -> String {
        sign(&test_key(), "67XV3VSJ95", "W23G28NPJW", 1_700_000_000).unwrap()
    }

    #[test]
    fn header_and_claims_layout() {
        let token = signed();

        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| !p.contains('=')));

        let header = BASE64URL.decode(parts[0]).unwrap();
        assert_eq!(header, br#"{"alg":"ES256","kid":"67XV3VSJ95"}"#);
        let claims = BASE64URL.decode(parts[1]).unwrap();
        assert_eq!(claims, br#"{"iss":"W23G28NPJW","iat":1700000000}"#);
        // raw r || s
        assert_eq!(BASE64URL.decode(parts[2]).unwrap().len(), 64);
    }

    #[test]
    fn verifies_with_own_key_only() {
        let token = signed();

        let verified = verify(&token, test_key().verifying_key()).unwrap();
        assert_eq!(verified.header.kid.as_deref(), Some("67XV3VSJ95"));
        assert_eq!(verified.header.alg, Algorithm::ES256);
        assert_eq!(verified.claims.iss, "W23G28NPJW");
        assert_eq!(verified.claims.iat, 1_700_000_000);

        let err = verify(&token, other_key().verifying_key()).unwrap_err();
        assert!(matches!(err, VerifyError::Signature), "{err:?}");
    }

    #[test]
    fn identity_must_match() {
        let key = test_key();
        let token = signed();

        assert!(verify_identity(&token, key.verifying_key(), "67XV3VSJ95", "W23G28NPJW").is_ok());
        assert!(matches!(
            verify_identity(&token, key.verifying_key(), "AAAAAAAAAA", "W23G28NPJW"),
            Err(VerifyError::KeyId(_))
        ));
        assert!(matches!(
            verify_identity(&token, key.verifying_key(), "67XV3VSJ95", "AAAAAAAAAA"),
            Err(VerifyError::Issuer(_))
        ));
    }

    #[test]
    fn tampered_claims_fail() {
        let token = signed();
        let parts: Vec<&str> = token.split('.').collect();
        let forged_claims = BASE64URL.encode(br#"{"iss":"AAAAAAAAAA","iat":1700000000}"#);
        let forged = format!("{}.{}.{}", parts[0], forged_claims, parts[2]);

        assert!(matches!(verify(&forged, test_key().verifying_key()), Err(VerifyError::Signature)));
    }

    #[test]
    fn unverified_decode_reads_claims() {
        let (header, claims) = decode_unverified(&signed()).unwrap();
        assert_eq!(header.kid.as_deref(), Some("67XV3VSJ95"));
        assert_eq!(claims.iat, 1_700_000_000);
    }

    #[test]
    fn malformed_tokens() {
        let key = test_key();
        assert!(matches!(verify("a.b", key.verifying_key()), Err(VerifyError::Malformed(_))));
        assert!(matches!(verify("!!.e30.AA", key.verifying_key()), Err(VerifyError::Malformed(_))));
        assert!(matches!(decode_unverified("not a token"), Err(VerifyError::Malformed(_))));
    }
}
