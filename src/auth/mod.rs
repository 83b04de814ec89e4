/// Auth cache: the single authority on whether a user is logged in.
///
/// Wraps a [`KeyValueStore`] scoped to the `auth` partition and exposes typed
/// session-token operations. One [`AuthCache`] is built per process and
/// cloned into every component that needs the token; nothing else reads the
/// token key directly.
///
/// Setting or clearing the token has no side effects beyond storage. Callers
/// re-derive dependent state (active view, login indicators) themselves.
use std::sync::Arc;

use tracing::warn;

use crate::store::{KeyValueStore, MemoryStore, StoreError};

/// Store key holding the session token.
pub const SESSION_TOKEN_KEY: &str = "sessionToken";

/// Shared handle to the session token.
#[derive(Clone)]
pub struct AuthCache {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for AuthCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthCache").finish_non_exhaustive()
    }
}

impl AuthCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// An auth cache that forgets everything when the process exits.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Return the session token, or `""` when logged out.
    ///
    /// A storage failure reads as logged out.
    pub fn get_token(&self) -> String {
        match self.store.get(SESSION_TOKEN_KEY) {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "failed to read session token, treating as logged out");
                String::new()
            }
        }
    }

    /// Store `token`. An empty token clears the session instead.
    pub fn set_token(&self, token: &str) -> Result<(), StoreError> {
        if token.is_empty() {
            return self.clear_token();
        }
        self.store.put(SESSION_TOKEN_KEY, token)
    }

    /// Remove the session token. Succeeds when already logged out.
    pub fn clear_token(&self) -> Result<(), StoreError> {
        self.store.delete(SESSION_TOKEN_KEY)
    }

    pub fn is_logged_in(&self) -> bool {
        !self.get_token().is_empty()
    }
}
