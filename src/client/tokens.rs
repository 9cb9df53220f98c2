use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::auth::token::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use crate::auth::{TokenPair, TokenResponse, TokenStore};

/// In-memory copy of the session tokens, written through to a [`TokenStore`].
///
/// Storage failures never fail a session operation: they are logged and the
/// in-memory copy stays authoritative for this process.
pub(crate) struct TokenManager {
    store: Arc<dyn TokenStore>,
    current: RwLock<TokenPair>,
}

impl TokenManager {
    /// Hydrate from whatever the store already holds.
    pub(crate) fn load(store: Arc<dyn TokenStore>) -> Self {
        let current = TokenPair {
            access_token: read_key(store.as_ref(), ACCESS_TOKEN_KEY),
            refresh_token: read_key(store.as_ref(), REFRESH_TOKEN_KEY),
        };
        Self {
            store,
            current: RwLock::new(current),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, TokenPair> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, TokenPair> {
        self.current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn snapshot(&self) -> TokenPair {
        self.read().clone()
    }

    pub(crate) fn access_token(&self) -> Option<String> {
        self.read().access_token.clone()
    }

    pub(crate) fn refresh_token(&self) -> Option<String> {
        self.read().refresh_token.clone()
    }

    /// Store a fresh credential set. A response without a refresh token
    /// keeps the one already held.
    pub(crate) fn save(&self, tokens: &TokenResponse) {
        let mut current = self.write();
        current.access_token = Some(tokens.access_token.clone());
        write_key(self.store.as_ref(), ACCESS_TOKEN_KEY, &tokens.access_token);
        if let Some(refresh) = &tokens.refresh_token {
            current.refresh_token = Some(refresh.clone());
            write_key(self.store.as_ref(), REFRESH_TOKEN_KEY, refresh);
        }
    }

    pub(crate) fn clear(&self) {
        let mut current = self.write();
        *current = TokenPair::default();
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY] {
            if let Err(err) = self.store.remove(key) {
                tracing::warn!(key, error = %err, "Failed to remove token from storage");
            }
        }
    }
}

fn read_key(store: &dyn TokenStore, key: &str) -> Option<String> {
    store.get(key).unwrap_or_else(|err| {
        tracing::warn!(key, error = %err, "Failed to read token from storage");
        None
    })
}

fn write_key(store: &dyn TokenStore, key: &str, value: &str) {
    if let Err(err) = store.set(key, value) {
        tracing::warn!(key, error = %err, "Failed to persist token");
    }
}
