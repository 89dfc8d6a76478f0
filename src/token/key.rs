//! P-256 private key handling.
//!
//! Keys arrive as a PEM `PRIVATE KEY` envelope around a PKCS#8 `PrivateKeyInfo`
//! (the `.p8` file format the push gateway hands out). Parsing is split in three
//! steps so each failure maps onto its own error:
//! envelope -> `MalformedEnvelope`, algorithm/curve -> `WrongKeyFamily`,
//! key bytes -> `CorruptKey`.

use std::fmt;

use jsonwebtoken::EncodingKey;
use p256::ecdsa::{SigningKey, VerifyingKey};
use p256::pkcs8::der::pem;
use p256::pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey, LineEnding, ObjectIdentifier, PrivateKeyInfo};

use crate::token::error::TokenError;

/// Only label accepted around the PKCS#8 document.
pub const PKCS8_PEM_LABEL: &str = "PRIVATE KEY";

/// id-ecPublicKey
const EC_PUBLIC_KEY_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
/// prime256v1 / secp256r1
const PRIME256V1_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");

/// Parsed P-256 signing key.
#[derive(Clone)]
pub struct PrivateKey(SigningKey);

impl PrivateKey {
    /// Parse a PEM encoded PKCS#8 P-256 private key.
    pub fn from_pem(bytes: &[u8]) -> Result<Self, TokenError> {
        let (label, der) = pem::decode_vec(bytes)
            .map_err(|e| TokenError::MalformedEnvelope(e.to_string()))?;
        if label != PKCS8_PEM_LABEL {
            return Err(TokenError::MalformedEnvelope(format!(
                "expected '{}' block, found '{}'",
                PKCS8_PEM_LABEL, label
            )));
        }
        Self::from_pkcs8_der(&der)
    }

    /// Parse a DER encoded PKCS#8 P-256 private key.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self, TokenError> {
        let info = PrivateKeyInfo::try_from(der)
            .map_err(|e| TokenError::CorruptKey(e.to_string()))?;

        if info.algorithm.oid != EC_PUBLIC_KEY_OID {
            return Err(TokenError::WrongKeyFamily(format!(
                "algorithm {}",
                info.algorithm.oid
            )));
        }
        let curve = info
            .algorithm
            .parameters_oid()
            .map_err(|e| TokenError::CorruptKey(e.to_string()))?;
        if curve != PRIME256V1_OID {
            return Err(TokenError::WrongKeyFamily(format!("curve {}", curve)));
        }

        SigningKey::from_pkcs8_der(der)
            .map(PrivateKey)
            .map_err(|e| TokenError::CorruptKey(e.to_string()))
    }

    /// PKCS#8 PEM form, suitable for [`PrivateKey::from_pem`].
    pub fn to_pem(&self) -> Result<String, TokenError> {
        self.0
            .to_pkcs8_pem(LineEnding::LF)
            .map(|pem| pem.to_string())
            .map_err(|e| TokenError::CorruptKey(e.to_string()))
    }

    /// SPKI `PUBLIC KEY` PEM of the matching public key.
    pub fn public_key_pem(&self) -> Result<String, TokenError> {
        self.verifying_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| TokenError::CorruptKey(e.to_string()))
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        self.0.verifying_key()
    }

    /// Unarmored PKCS#8 document, suitable for [`PrivateKey::from_pkcs8_der`].
    pub fn to_pkcs8_der(&self) -> Result<Vec<u8>, TokenError> {
        self.0
            .to_pkcs8_der()
            .map(|der| der.as_bytes().to_vec())
            .map_err(|e| TokenError::CorruptKey(e.to_string()))
    }

    pub(crate) fn encoding_key(&self) -> Result<EncodingKey, TokenError> {
        Ok(EncodingKey::from_ec_der(&self.to_pkcs8_der()?))
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey").finish_non_exhaustive()
    }
}
