//! Locally merged roster state
//!
//! Eventually consistent by set union: every incoming announcement's roster
//! is merged in, and the announcing peer's own name is authoritative for
//! "this name exists". Removal is best effort only.

use parking_lot::RwLock;

use natter_proto::Roster;

/// Roster shared between the receive loop, the heartbeat task, and callers
#[derive(Default)]
pub struct SharedRoster {
    inner: RwLock<Roster>,
}

impl SharedRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one name; returns true if it was new
    pub fn insert(&self, name: &str) -> bool {
        self.inner.write().insert(name.to_string())
    }

    /// Remove one name; returns true if it was present
    pub fn remove(&self, name: &str) -> bool {
        self.inner.write().remove(name)
    }

    /// Union-merge another roster in; returns true if anything was added
    pub fn merge(&self, other: &Roster) -> bool {
        let mut inner = self.inner.write();
        let before = inner.len();
        inner.extend(other.iter().cloned());
        inner.len() != before
    }

    /// Point-in-time copy
    pub fn snapshot(&self) -> Roster {
        self.inner.read().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
