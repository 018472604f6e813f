//! # Session Store
//!
//! Injected key-value capability holding the active credential between
//! operations. The embedding UI backs this with its session storage; headless
//! callers and tests use the in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Storage key for the active credential
pub const CREDENTIAL_KEY: &str = "wallet.credential";

/// Minimal key-value capability for session-scoped state
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn put(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Type alias for a shared session store (dynamic dispatch)
pub type BoxedSessionStore = Arc<dyn SessionStore>;

/// In-memory session store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .expect("session store lock poisoned")
            .get(key)
            .cloned()
    }

    fn put(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .expect("session store lock poisoned")
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .expect("session store lock poisoned")
            .remove(key);
    }
}
