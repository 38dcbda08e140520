//! Authentication signal consumed by user-scoped stores and trackers.
//!
//! Session issuance lives elsewhere; this layer only needs to know whether a
//! user is signed in and who they are.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

pub trait AuthSignal: Send + Sync + std::fmt::Debug {
    fn is_authenticated(&self) -> bool;

    /// Opaque user identifier, `None` for anonymous sessions.
    fn user_id(&self) -> Option<String>;
}

/// Shared auth handle.
pub type SharedAuth = Arc<dyn AuthSignal>;

/// Permanently anonymous session.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl AuthSignal for Anonymous {
    fn is_authenticated(&self) -> bool {
        false
    }

    fn user_id(&self) -> Option<String> {
        None
    }
}

/// Session state flipped by the login flow.
#[derive(Debug, Default)]
pub struct SessionAuth {
    user: RwLock<Option<String>>,
}

impl SessionAuth {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self {
            user: RwLock::new(Some(user_id.into())),
        }
    }

    pub fn sign_in(&self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        info!(user_id = %user_id, "session authenticated");
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = Some(user_id);
    }

    pub fn sign_out(&self) {
        info!("session signed out");
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl AuthSignal for SessionAuth {
    fn is_authenticated(&self) -> bool {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn user_id(&self) -> Option<String> {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
