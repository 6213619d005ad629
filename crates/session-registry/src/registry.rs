use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::RegistryConfig;
use crate::entry::Session;
use crate::token::{redact, SessionToken};

/// Token-keyed, time-bounded credential store.
///
/// Cloning is cheap; every clone shares the same table. Entries are sharded
/// by DashMap, so each operation locks a single shard for the duration of one
/// record's worth of work.
pub struct SessionRegistry<C> {
    inner: Arc<Inner<C>>,
}

struct Inner<C> {
    sessions: DashMap<SessionToken, Session<C>>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
}

impl<C> Clone for SessionRegistry<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> SessionRegistry<C>
where
    C: Clone + Send + Sync + 'static,
{
    pub fn new(config: &RegistryConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &RegistryConfig, clock: Arc<dyn Clock>) -> Self {
        info!(
            "Initializing session registry (ttl={}s, sweep every {}s)",
            config.ttl_seconds, config.sweep_interval_seconds
        );
        Self {
            inner: Arc::new(Inner {
                sessions: DashMap::new(),
                clock,
                default_ttl: config.ttl(),
            }),
        }
    }

    /// Store `credential` under a fresh token, valid for the default TTL.
    pub fn create(&self, credential: C) -> SessionToken {
        self.create_with_ttl(credential, self.inner.default_ttl)
    }

    pub fn create_with_ttl(&self, credential: C, ttl: Duration) -> SessionToken {
        let session = Session::new(credential, self.inner.clock.now(), ttl);

        loop {
            match self.inner.sessions.entry(SessionToken::generate()) {
                Entry::Vacant(slot) => {
                    let token = slot.key().clone();
                    slot.insert(session);
                    debug!(
                        "Created session {} (ttl={}s)",
                        token.redacted(),
                        ttl.as_secs()
                    );
                    return token;
                }
                Entry::Occupied(slot) => {
                    warn!("Token collision on {}, regenerating", slot.key().redacted());
                }
            }
        }
    }

    /// Credential for `token`, or `None` if unknown, deleted or expired.
    ///
    /// An expired entry found here is removed on the spot.
    pub fn get(&self, token: &str) -> Option<C> {
        let now = self.inner.clock.now();

        match self.inner.sessions.get(token) {
            None => return None,
            Some(session) if !session.is_expired(now) => {
                return Some(session.credential.clone());
            }
            Some(_) => {}
        }

        // Read guard is released; re-check under the write lock.
        if self
            .inner
            .sessions
            .remove_if(token, |_, session| session.is_expired(now))
            .is_some()
        {
            debug!("Session {} expired, removed on read", redact(token));
        }
        None
    }

    /// Remove `token`. No-op when it is absent.
    pub fn delete(&self, token: &str) {
        if self.inner.sessions.remove(token).is_some() {
            debug!("Deleted session {}", redact(token));
        }
    }

    /// Remove every expired entry. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.inner.clock.now();
        let mut removed = 0;

        self.inner.sessions.retain(|_, session| {
            let keep = !session.is_expired(now);
            if !keep {
                removed += 1;
            }
            keep
        });

        removed
    }

    /// Physical entry count, including expired entries not yet swept.
    pub fn len(&self) -> usize {
        self.inner.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.sessions.is_empty()
    }

    pub fn default_ttl(&self) -> Duration {
        self.inner.default_ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[derive(Debug, Clone, PartialEq)]
    struct Creds {
        host: String,
        port: u16,
        user: String,
        password: String,
        database: String,
    }

    fn creds() -> Creds {
        Creds {
            host: "db".to_string(),
            port: 5432,
            user: "u".to_string(),
            password: "p".to_string(),
            database: "d".to_string(),
        }
    }

    fn registry() -> (SessionRegistry<Creds>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        let registry = SessionRegistry::with_clock(&RegistryConfig::default(), clock.clone());
        (registry, clock)
    }

    #[test]
    fn test_get_after_create_returns_credential() {
        let (registry, _) = registry();
        let token = registry.create(creds());

        assert_eq!(registry.get(token.as_str()), Some(creds()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_token_not_found() {
        let (registry, _) = registry();
        registry.create(creds());

        assert_eq!(registry.get("never-issued"), None);
        assert_eq!(registry.get(SessionToken::generate().as_str()), None);
    }

    #[test]
    fn test_default_ttl_applies() {
        let (registry, clock) = registry();
        let token = registry.create(creds());

        clock.advance(Duration::from_secs(1799));
        assert!(registry.get(token.as_str()).is_some());

        clock.advance(Duration::from_secs(1));
        assert!(registry.get(token.as_str()).is_none());
    }

    #[test]
    fn test_expired_entry_removed_on_read_without_sweep() {
        let (registry, clock) = registry();
        let token = registry.create_with_ttl(creds(), Duration::from_secs(5));

        clock.advance(Duration::from_secs(5));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(token.as_str()), None);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_reads_do_not_renew() {
        let (registry, clock) = registry();
        let token = registry.create_with_ttl(creds(), Duration::from_secs(10));

        for _ in 0..9 {
            clock.advance(Duration::from_secs(1));
            assert!(registry.get(token.as_str()).is_some());
        }
        clock.advance(Duration::from_secs(1));
        assert!(registry.get(token.as_str()).is_none());
    }

    #[test]
    fn test_delete_then_get_not_found() {
        let (registry, _) = registry();
        let token = registry.create(creds());

        registry.delete(token.as_str());
        assert_eq!(registry.get(token.as_str()), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (registry, _) = registry();
        let keep = registry.create(creds());
        let token = registry.create(creds());

        registry.delete(token.as_str());
        registry.delete(token.as_str());
        registry.delete("never-issued");

        assert_eq!(registry.len(), 1);
        assert!(registry.get(keep.as_str()).is_some());
    }

    #[test]
    fn test_sweep_removes_exactly_expired() {
        let (registry, clock) = registry();
        let short: Vec<_> = (0..3)
            .map(|_| registry.create_with_ttl(creds(), Duration::from_secs(10)))
            .collect();
        let long: Vec<_> = (0..4)
            .map(|_| registry.create_with_ttl(creds(), Duration::from_secs(100)))
            .collect();

        clock.advance(Duration::from_secs(50));
        assert_eq!(registry.sweep(), 3);
        assert_eq!(registry.len(), 4);

        for token in &short {
            assert!(registry.get(token.as_str()).is_none());
        }
        for token in &long {
            assert_eq!(registry.get(token.as_str()), Some(creds()));
        }

        assert_eq!(registry.sweep(), 0);
    }

    #[test]
    fn test_sweep_and_read_agree_at_boundary() {
        let (registry, clock) = registry();
        let a = registry.create_with_ttl(creds(), Duration::from_secs(30));
        let b = registry.create_with_ttl(creds(), Duration::from_secs(30));

        clock.advance(Duration::from_secs(30));
        assert!(registry.get(a.as_str()).is_none());
        assert_eq!(registry.sweep(), 1);
        assert!(registry.get(b.as_str()).is_none());
    }

    #[test]
    fn test_scenario_thirty_second_session() {
        let (registry, clock) = registry();
        let token = registry.create_with_ttl(creds(), Duration::from_secs(30));

        clock.advance(Duration::from_secs(10));
        assert_eq!(registry.get(token.as_str()), Some(creds()));

        clock.advance(Duration::from_secs(21));
        assert_eq!(registry.get(token.as_str()), None);

        registry.delete(token.as_str());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_clones_share_table() {
        let (registry, _) = registry();
        let other = registry.clone();
        let token = registry.create(creds());

        assert_eq!(other.get(token.as_str()), Some(creds()));
        other.delete(token.as_str());
        assert!(registry.get(token.as_str()).is_none());
    }
}
