pub mod common;
pub mod concurrent_signing;
