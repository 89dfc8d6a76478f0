//! Provider token core: identifiers, key store, ES256 signing and the
//! cached bearer token.

pub mod armor;
pub mod error;
pub mod identifier;
pub mod jwt;
pub mod key;
pub mod provider;
pub mod record;
pub mod refresh;

pub use error::{IdentifierError, TokenError};
pub use key::PrivateKey;
pub use provider::{ProviderToken, DEFAULT_REFRESH_AFTER};
pub use record::ProviderTokenRecord;
