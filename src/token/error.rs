use thiserror::Error;

/// Why a team or key identifier was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("expected {expected} characters, got {actual}")]
    WrongLength { expected: usize, actual: usize },
    #[error("character {character:?} at position {position} is not in [0-9A-Z]")]
    DisallowedCharacter { character: char, position: usize },
}

/// ================================
/// Provider token errors
/// ================================
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("bad team identifier: {0}")]
    BadTeamIdentifier(IdentifierError),

    #[error("bad key identifier: {0}")]
    BadKeyIdentifier(IdentifierError),

    #[error("no private key set")]
    NoPrivateKey,

    /// The key source could not be read; nothing was parsed.
    #[error("could not read private key from {origin}: {reason}")]
    KeySourceUnreadable { origin: String, reason: String },

    #[error("malformed private key envelope: {0}")]
    MalformedEnvelope(String),

    #[error("private key is not a P-256 elliptic-curve key: {0}")]
    WrongKeyFamily(String),

    #[error("corrupt private key: {0}")]
    CorruptKey(String),

    #[error("token signing failed: {0}")]
    Signing(String),

    /// The structured form itself is malformed (syntax or shape).
    #[error("malformed provider token record: {0}")]
    Decode(String),

    #[error("could not encode provider token: {0}")]
    Encode(String),

    /// A bearer token did not verify against this provider token.
    #[error("bearer token rejected: {0}")]
    Verify(String),
}

impl TokenError {
    /// Failures a caller can fix by loading a key and calling again.
    pub fn is_missing_key(&self) -> bool {
        matches!(self, TokenError::NoPrivateKey)
    }
}
