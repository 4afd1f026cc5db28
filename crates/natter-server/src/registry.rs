//! Session registry
//!
//! Authoritative mapping of active display names to outbound sinks. All
//! mutation happens under one mutex so the uniqueness check, the capacity
//! check, and the insert are indivisible; concurrent attempts are ordered
//! by lock acquisition. Reads hand out copies that stay valid while the
//! registry keeps mutating.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use natter_proto::Roster;

use crate::sink::SessionSink;

/// Why a registration attempt was refused.
///
/// The `Display` strings double as the wire-level rejection reasons.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegisterError {
    #[error("Login is already used!")]
    DuplicateName,

    #[error("Limit of online users on the server has been reached: {0}")]
    CapacityExceeded(usize),
}

/// Opaque handle for one successful registration.
///
/// Deliberately not `Clone`: exactly one owner may unregister with it.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct SessionToken(u64);

struct SessionEntry {
    name: String,
    sink: Arc<dyn SessionSink>,
}

struct Inner {
    next_token: u64,
    sessions: HashMap<u64, SessionEntry>,
}

/// The set of active sessions and their sinks
pub struct Registry {
    max_users: usize,
    inner: Mutex<Inner>,
}

impl Registry {
    pub fn new(max_users: usize) -> Self {
        Self {
            max_users,
            inner: Mutex::new(Inner {
                next_token: 1,
                sessions: HashMap::new(),
            }),
        }
    }

    /// Maximum number of simultaneously active sessions
    pub fn max_users(&self) -> usize {
        self.max_users
    }

    /// Atomically claim `name` and register `sink` under it.
    ///
    /// Uniqueness and capacity are evaluated against the state at the time
    /// the lock is acquired; of two concurrent attempts with the same name,
    /// the first to acquire wins and the other gets [`RegisterError::DuplicateName`].
    pub fn try_register(
        &self,
        name: &str,
        sink: Arc<dyn SessionSink>,
    ) -> Result<SessionToken, RegisterError> {
        let mut inner = self.inner.lock();

        if inner.sessions.values().any(|entry| entry.name == name) {
            return Err(RegisterError::DuplicateName);
        }
        if inner.sessions.len() >= self.max_users {
            return Err(RegisterError::CapacityExceeded(self.max_users));
        }

        let token = inner.next_token;
        inner.next_token += 1;
        inner.sessions.insert(
            token,
            SessionEntry {
                name: name.to_string(),
                sink,
            },
        );
        Ok(SessionToken(token))
    }

    /// Remove the session identified by `token`.
    ///
    /// Idempotent: a second call for the same token is a no-op. Returns the
    /// removed name, if the session was still present.
    pub fn unregister(&self, token: &SessionToken) -> Option<String> {
        let mut inner = self.inner.lock();
        inner.sessions.remove(&token.0).map(|entry| entry.name)
    }

    /// Point-in-time copy of the active names, safe to use outside the lock
    pub fn snapshot(&self) -> Roster {
        let inner = self.inner.lock();
        inner
            .sessions
            .values()
            .map(|entry| entry.name.clone())
            .collect()
    }

    /// Copy of the current sink list.
    ///
    /// Taken under the lock, used after release, so one slow peer's write
    /// cannot delay registration or other peers' delivery.
    pub fn sinks(&self) -> Vec<Arc<dyn SessionSink>> {
        let inner = self.inner.lock();
        inner
            .sessions
            .values()
            .map(|entry| Arc::clone(&entry.sink))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::ChannelSink;
    use natter_proto::MAX_USERS;

    fn sink() -> Arc<dyn SessionSink> {
        let (sink, rx) = ChannelSink::new();
        // Keep the mailbox alive for the duration of the test.
        std::mem::forget(rx);
        sink
    }

    #[test]
    fn duplicate_name_refused() {
        let registry = Registry::new(MAX_USERS);
        registry.try_register("alice", sink()).unwrap();
        let err = registry.try_register("alice", sink()).unwrap_err();
        assert_eq!(err, RegisterError::DuplicateName);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn capacity_enforced_at_max_users() {
        let registry = Registry::new(MAX_USERS);
        for i in 0..MAX_USERS {
            registry.try_register(&format!("user{i}"), sink()).unwrap();
        }
        let err = registry.try_register("late", sink()).unwrap_err();
        assert_eq!(err, RegisterError::CapacityExceeded(MAX_USERS));
        assert_eq!(registry.len(), MAX_USERS);
    }

    #[test]
    fn unregister_is_idempotent() {
        let registry = Registry::new(MAX_USERS);
        let token = registry.try_register("alice", sink()).unwrap();
        assert_eq!(registry.unregister(&token), Some("alice".to_string()));
        assert_eq!(registry.unregister(&token), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn freed_slot_and_name_are_reusable() {
        let registry = Registry::new(1);
        let token = registry.try_register("alice", sink()).unwrap();
        assert!(registry.try_register("alice", sink()).is_err());
        registry.unregister(&token);
        registry.try_register("alice", sink()).unwrap();
    }

    #[test]
    fn snapshot_is_detached_from_later_mutation() {
        let registry = Registry::new(MAX_USERS);
        registry.try_register("alice", sink()).unwrap();
        let snap = registry.snapshot();
        registry.try_register("bob", sink()).unwrap();
        assert_eq!(snap.len(), 1);
        assert!(snap.contains("alice"));
    }

    #[test]
    fn concurrent_attempts_with_same_name_yield_one_winner() {
        let registry = Arc::new(Registry::new(MAX_USERS));
        let mut handles = Vec::new();
        for _ in 0..16 {
            let registry = Arc::clone(&registry);
            handles.push(std::thread::spawn(move || {
                registry.try_register("alice", sink()).is_ok()
            }));
        }
        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(wins, 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn concurrent_fill_never_exceeds_capacity() {
        let registry = Arc::new(Registry::new(MAX_USERS));
        let mut handles = Vec::new();
        for i in 0..MAX_USERS + 5 {
            let registry = Arc::clone(&registry);
            handles.push(std::thread::spawn(move || {
                registry.try_register(&format!("user{i}"), sink())
            }));
        }
        let mut rejected = 0;
        for handle in handles {
            if let Err(err) = handle.join().unwrap() {
                assert_eq!(err, RegisterError::CapacityExceeded(MAX_USERS));
                rejected += 1;
            }
        }
        assert_eq!(rejected, 5);
        assert_eq!(registry.len(), MAX_USERS);
    }
}
