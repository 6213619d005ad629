use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

/// A credential and its validity window.
#[derive(Debug, Clone)]
pub struct Session<C> {
    pub credential: C,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl<C> Session<C> {
    pub fn new(credential: C, created_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            credential,
            created_at,
            expires_at: expiry_after(created_at, ttl),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        is_expired(now, self.expires_at)
    }
}

/// The single expiry rule. Both the read path and the sweep go through here.
pub fn is_expired(now: DateTime<Utc>, expires_at: DateTime<Utc>) -> bool {
    now >= expires_at
}

/// `at + ttl`, saturating at the largest representable instant.
pub fn expiry_after(at: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(ttl)
        .ok()
        .and_then(|delta| at.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
