// Credential storage
// Key-value capability injected into the client in place of ambient browser storage

use dashmap::DashMap;
use std::sync::Arc;

/// Storage key of the access credential
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Storage key of the refresh credential
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// String-valued key-value store holding the credential pair.
///
/// Reads and writes are not coordinated across callers: concurrent writers
/// simply overwrite each other.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory store. Clones share the same entries.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with whichever credentials are given
    pub fn with_credentials(access_token: Option<&str>, refresh_token: Option<&str>) -> Self {
        let store = Self::new();
        save_credentials(&store, access_token, refresh_token);
        store
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TokenStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.remove(key);
    }
}

/// Persist the given credentials, leaving absent ones untouched
pub fn save_credentials(
    store: &dyn TokenStore,
    access_token: Option<&str>,
    refresh_token: Option<&str>,
) {
    if let Some(token) = access_token {
        store.set(ACCESS_TOKEN_KEY, token);
    }
    if let Some(token) = refresh_token {
        store.set(REFRESH_TOKEN_KEY, token);
    }
}

/// Remove both credentials
pub fn clear_credentials(store: &dyn TokenStore) {
    store.remove(ACCESS_TOKEN_KEY);
    store.remove(REFRESH_TOKEN_KEY);
}

/// Read a credential, treating an empty string as absent
pub(crate) fn credential(store: &dyn TokenStore, key: &str) -> Option<String> {
    store.get(key).filter(|token| !token.is_empty())
}
