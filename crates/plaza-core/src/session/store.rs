//! The session store: one authenticated identity per client, with an
//! explicit initialize/subscribe/teardown lifecycle.

use std::sync::Arc;
use tokio::sync::RwLock;

use super::model::{SessionChange, SessionState};
use crate::backend::{AuthProvider, Identity, UserId};
use crate::error::Result;

/// Callback type for session transitions.
pub type SessionCallback = Arc<dyn Fn(&SessionChange) + Send + Sync>;

/// Holds the current authenticated identity (or none) and exposes
/// sign-in/sign-up/sign-out.
///
/// `SessionStore` is explicitly constructed and passed to every component
/// that needs identity; it is the only mutator of the session state, all
/// other components read through it. Subscribers are notified synchronously
/// after each transition; the callbacks have returned before the
/// triggering call does.
pub struct SessionStore {
    auth: Arc<dyn AuthProvider>,
    state: RwLock<SessionState>,
    subscribers: RwLock<Vec<SessionCallback>>,
}

impl SessionStore {
    /// Creates a store in the `Initializing` state.
    pub fn new(auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            auth,
            state: RwLock::new(SessionState::Initializing),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Resolves the startup state against the backend.
    ///
    /// Queries the provider for an existing valid credential and
    /// transitions to `Authenticated` or `Anonymous`. Call once, before any
    /// dependent component reads the session; a repeated call is a logged
    /// no-op. A provider failure degrades to `Anonymous`.
    pub async fn initialize(&self) -> Result<()> {
        {
            let state = self.state.read().await;
            if state.is_ready() {
                tracing::warn!("session store already initialized");
                return Ok(());
            }
        }

        let resolved = match self.auth.current_identity().await {
            Ok(Some(identity)) => SessionState::Authenticated(identity),
            Ok(None) => SessionState::Anonymous,
            Err(err) => {
                tracing::warn!(error = %err, "credential check failed, starting anonymous");
                SessionState::Anonymous
            }
        };
        self.transition(resolved).await;
        Ok(())
    }

    /// Verifies credentials and transitions to `Authenticated`.
    ///
    /// # Errors
    ///
    /// Propagates the provider's `Auth` rejection; the session state is
    /// left untouched on failure.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        let identity = self.auth.sign_in(email, password).await?;
        self.transition(SessionState::Authenticated(identity.clone()))
            .await;
        Ok(identity)
    }

    /// Registers a new account and transitions to `Authenticated`.
    ///
    /// # Errors
    ///
    /// Propagates the provider's `Auth` rejection (duplicate email,
    /// policy-rejected password); the session state is left untouched.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Identity> {
        let identity = self.auth.sign_up(email, password).await?;
        self.transition(SessionState::Authenticated(identity.clone()))
            .await;
        Ok(identity)
    }

    /// Clears the identity and transitions to `Anonymous`.
    ///
    /// Always succeeds locally; the backend is not consulted.
    pub async fn sign_out(&self) {
        self.transition(SessionState::Anonymous).await;
    }

    /// Registers a callback invoked on every transition.
    pub async fn subscribe(&self, callback: SessionCallback) {
        self.subscribers.write().await.push(callback);
    }

    /// Returns a copy of the current state.
    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Returns the current viewer id, if authenticated.
    pub async fn user_id(&self) -> Option<UserId> {
        self.state.read().await.user_id().cloned()
    }

    async fn transition(&self, next: SessionState) {
        let change = {
            let mut state = self.state.write().await;
            let previous = std::mem::replace(&mut *state, next.clone());
            SessionChange {
                previous,
                current: next,
            }
        };
        if change.identity_changed() {
            tracing::debug!(
                previous = ?change.previous.user_id(),
                current = ?change.current.user_id(),
                "viewer identity changed, cached interaction flags are stale"
            );
        }
        let subscribers = self.subscribers.read().await.clone();
        for callback in &subscribers {
            callback(&change);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlazaError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Mock AuthProvider for testing
    struct MockAuth {
        stored: Option<Identity>,
        reject: bool,
    }

    impl MockAuth {
        fn anonymous() -> Self {
            Self {
                stored: None,
                reject: false,
            }
        }

        fn with_identity(id: &str) -> Self {
            Self {
                stored: Some(Identity::new(UserId::new(id), format!("{id}@example.com"))),
                reject: false,
            }
        }

        fn rejecting() -> Self {
            Self {
                stored: None,
                reject: true,
            }
        }
    }

    #[async_trait]
    impl AuthProvider for MockAuth {
        async fn sign_in(&self, email: &str, _password: &str) -> Result<Identity> {
            if self.reject {
                return Err(PlazaError::auth("invalid credentials"));
            }
            Ok(Identity::new(UserId::new("u1"), email))
        }

        async fn sign_up(&self, email: &str, _password: &str) -> Result<Identity> {
            if self.reject {
                return Err(PlazaError::auth("duplicate email"));
            }
            Ok(Identity::new(UserId::new("u2"), email))
        }

        async fn current_identity(&self) -> Result<Option<Identity>> {
            if self.reject {
                return Err(PlazaError::query("provider unreachable"));
            }
            Ok(self.stored.clone())
        }
    }

    #[tokio::test]
    async fn test_initialize_resolves_anonymous() {
        let store = SessionStore::new(Arc::new(MockAuth::anonymous()));
        assert_eq!(store.snapshot().await, SessionState::Initializing);

        store.initialize().await.unwrap();
        assert_eq!(store.snapshot().await, SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_initialize_restores_identity() {
        let store = SessionStore::new(Arc::new(MockAuth::with_identity("u9")));
        store.initialize().await.unwrap();
        assert_eq!(store.user_id().await, Some(UserId::new("u9")));
    }

    #[tokio::test]
    async fn test_initialize_degrades_to_anonymous_on_provider_error() {
        let store = SessionStore::new(Arc::new(MockAuth::rejecting()));
        store.initialize().await.unwrap();
        assert_eq!(store.snapshot().await, SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_initialize_twice_is_noop() {
        let store = SessionStore::new(Arc::new(MockAuth::with_identity("u9")));
        store.initialize().await.unwrap();
        store.sign_out().await;

        // The repeated call must not re-enter Initializing or re-resolve.
        store.initialize().await.unwrap();
        assert_eq!(store.snapshot().await, SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_sign_in_failure_leaves_state_unchanged() {
        let store = SessionStore::new(Arc::new(MockAuth::rejecting()));
        store.initialize().await.unwrap();

        let err = store.sign_in("a@example.com", "pw").await.unwrap_err();
        assert!(err.is_auth());
        assert_eq!(store.snapshot().await, SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_sign_in_success_carries_confirmed_identity() {
        let store = SessionStore::new(Arc::new(MockAuth::anonymous()));
        store.initialize().await.unwrap();

        let identity = store.sign_in("a@example.com", "pw").await.unwrap();
        assert_eq!(identity.user_id, UserId::new("u1"));
        assert_eq!(store.user_id().await, Some(UserId::new("u1")));
    }

    #[tokio::test]
    async fn test_sign_out_clears_identity() {
        let store = SessionStore::new(Arc::new(MockAuth::with_identity("u9")));
        store.initialize().await.unwrap();
        store.sign_out().await;
        assert_eq!(store.snapshot().await, SessionState::Anonymous);
        assert_eq!(store.user_id().await, None);
    }

    #[tokio::test]
    async fn test_subscribers_notified_synchronously() {
        let store = SessionStore::new(Arc::new(MockAuth::anonymous()));
        store.initialize().await.unwrap();

        let seen: Arc<Mutex<Vec<SessionChange>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        store
            .subscribe(Arc::new(move |change: &SessionChange| {
                sink.lock().unwrap().push(change.clone());
            }))
            .await;

        store.sign_in("a@example.com", "pw").await.unwrap();

        // The callback ran before sign_in returned.
        let changes = seen.lock().unwrap();
        assert_eq!(changes.len(), 1);
        assert!(changes[0].identity_changed());
        assert_eq!(changes[0].previous, SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_every_transition_notifies() {
        let store = SessionStore::new(Arc::new(MockAuth::anonymous()));
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        store
            .subscribe(Arc::new(move |_change: &SessionChange| {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .await;

        store.initialize().await.unwrap();
        store.sign_in("a@example.com", "pw").await.unwrap();
        store.sign_out().await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }
}
