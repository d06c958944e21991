use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::models::Credential;

/// Holds the current credential for the lifetime of the process.
///
/// Clones share the same slot. Every write replaces the whole `Credential`,
/// so readers never observe a token without its matching login flag.
#[derive(Clone, Default)]
pub struct CredentialStore {
    inner: Arc<RwLock<Credential>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that starts out logged in with `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        CredentialStore {
            inner: Arc::new(RwLock::new(Credential::logged_in(token))),
        }
    }

    pub fn get(&self) -> Credential {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn token(&self) -> Option<String> {
        self.get().access_token
    }

    pub fn set(&self, token: impl Into<String>) {
        let credential = Credential::logged_in(token);
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = credential;
        debug!(event_name = "store.credential.set", event_domain = "store", "access token stored");
    }

    /// Drop the token. Returns whether a session was active.
    pub fn clear(&self) -> bool {
        let previous = std::mem::take(&mut *self.inner.write().unwrap_or_else(PoisonError::into_inner));
        debug!(
            event_name = "store.credential.cleared",
            event_domain = "store",
            was_logged_in = previous.is_logged_in,
            "access token cleared"
        );
        previous.is_logged_in
    }
}
