//! Session domain model.

use serde::{Deserialize, Serialize};

use crate::backend::{Identity, UserId};

/// The lifecycle state of the one session a client owns.
///
/// Created in `Initializing`; resolves to `Authenticated` or `Anonymous`
/// once the backend has confirmed the current credentials (or their
/// absence). `Authenticated` and `Anonymous` convert into each other via
/// sign-in/sign-up/sign-out; nothing transitions back to `Initializing`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SessionState {
    /// Startup state, before the backend has confirmed anything.
    Initializing,
    /// Ready, no identity.
    Anonymous,
    /// Ready, with a backend-confirmed identity.
    Authenticated(Identity),
}

impl SessionState {
    /// True once initialization has resolved, with or without an identity.
    pub fn is_ready(&self) -> bool {
        !matches!(self, Self::Initializing)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.identity().map(|identity| &identity.user_id)
    }
}

/// Payload delivered to session subscribers on every transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionChange {
    pub previous: SessionState,
    pub current: SessionState,
}

impl SessionChange {
    /// True when the viewing identity differs across the transition.
    ///
    /// Any cached `viewer_has_liked`/`viewer_has_saved` value observed
    /// under the previous identity is stale once this returns true;
    /// consumers must re-derive those flags through a fresh feed load.
    pub fn identity_changed(&self) -> bool {
        self.previous.user_id() != self.current.user_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(id: &str) -> Identity {
        Identity::new(UserId::new(id), format!("{id}@example.com"))
    }

    #[test]
    fn test_ready_states() {
        assert!(!SessionState::Initializing.is_ready());
        assert!(SessionState::Anonymous.is_ready());
        assert!(SessionState::Authenticated(identity("u1")).is_ready());
    }

    #[test]
    fn test_user_id_present_iff_authenticated() {
        assert_eq!(SessionState::Initializing.user_id(), None);
        assert_eq!(SessionState::Anonymous.user_id(), None);
        let state = SessionState::Authenticated(identity("u1"));
        assert_eq!(state.user_id(), Some(&UserId::new("u1")));
    }

    #[test]
    fn test_identity_changed() {
        let sign_in = SessionChange {
            previous: SessionState::Anonymous,
            current: SessionState::Authenticated(identity("u1")),
        };
        assert!(sign_in.identity_changed());

        let switch = SessionChange {
            previous: SessionState::Authenticated(identity("u1")),
            current: SessionState::Authenticated(identity("u2")),
        };
        assert!(switch.identity_changed());

        let same = SessionChange {
            previous: SessionState::Authenticated(identity("u1")),
            current: SessionState::Authenticated(identity("u1")),
        };
        assert!(!same.identity_changed());
    }
}
