//! In-memory keyed stores shared by the HTTP surface and the supervisors.

use crate::gateway::SessionHandle;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

/// Map of client id → live connection handle. The sole authority for whether
/// a tenant currently has an active session.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<SessionHandle>>,
}

/// Outcome of a registration attempt.
pub enum Registration {
    Inserted,
    /// Another handle was registered first; the caller's handle is not
    /// canonical and must be discarded.
    AlreadyRegistered(Arc<SessionHandle>),
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, client_id: &str) -> Option<Arc<SessionHandle>> {
        self.sessions.get(client_id).map(|entry| entry.value().clone())
    }

    /// Registers `handle` unless the slot is already taken.
    pub fn register(&self, client_id: &str, handle: Arc<SessionHandle>) -> Registration {
        match self.sessions.entry(client_id.to_string()) {
            Entry::Occupied(entry) => Registration::AlreadyRegistered(entry.get().clone()),
            Entry::Vacant(slot) => {
                slot.insert(handle);
                Registration::Inserted
            }
        }
    }

    /// Removes the entry only while it still points at `handle`, so the
    /// handler of a dead connection cannot evict the reconnection that
    /// replaced it.
    pub fn remove_if_current(&self, client_id: &str, handle: &Arc<SessionHandle>) -> bool {
        self.sessions
            .remove_if(client_id, |_, current| Arc::ptr_eq(current, handle))
            .is_some()
    }
}

/// Latest unconsumed pairing challenge per client id. Each new challenge
/// overwrites the previous one; entries are cleared once the connection opens
/// or dies terminally.
#[derive(Default)]
pub struct QrChannel {
    codes: DashMap<String, String>,
}

impl QrChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, client_id: &str, code: String) {
        self.codes.insert(client_id.to_string(), code);
    }

    pub fn get(&self, client_id: &str) -> Option<String> {
        self.codes.get(client_id).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, client_id: &str) {
        self.codes.remove(client_id);
    }
}
