use std::time::Duration;

use crate::helpers::time::now_i64;

/// Signed bearer token together with the second it was issued.
///
/// Both fields are produced by one signing call and stored as one value, so a
/// cached token never disagrees with its issue time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedToken {
    pub value: String,
    pub issued_at: i64, // UNIX TIMESTAMP
}

impl SignedToken {
    pub fn new(value: String, issued_at: i64) -> Self {
        Self { value, issued_at }
    }

    /// Age in whole seconds at `now`; never negative.
    pub fn age_at(&self, now: i64) -> u64 {
        (now - self.issued_at).max(0) as u64
    }

    /// A token may be reused while it is younger than `refresh_after`.
    pub fn is_fresh_at(&self, now: i64, refresh_after: Duration) -> bool {
        self.age_at(now) < refresh_after.as_secs()
    }

    pub fn is_fresh(&self, refresh_after: Duration) -> bool {
        self.is_fresh_at(now_i64(), refresh_after)
    }

    /// Unix second at which the token stops being reused.
    pub fn refresh_at(&self, refresh_after: Duration) -> i64 {
        self.issued_at + refresh_after.as_secs() as i64
    }
}
