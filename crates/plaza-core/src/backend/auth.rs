//! Credential verification at the backend boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// Opaque identifier of an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A backend-confirmed identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub email: String,
}

impl Identity {
    pub fn new(user_id: UserId, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
        }
    }
}

/// An abstract credential provider.
///
/// All three operations are suspension points. Rejections surface as the
/// `Auth` error variant; the session state machine never advances on a
/// rejected call.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Verifies credentials and returns the confirmed identity.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity>;

    /// Registers a new account. Fails on duplicate email or a
    /// policy-rejected password.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity>;

    /// Resolves the identity behind any existing valid credential.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(identity))`: a valid credential exists
    /// - `Ok(None)`: no credential, the viewer is anonymous
    /// - `Err(_)`: the provider could not be reached
    async fn current_identity(&self) -> Result<Option<Identity>>;
}
