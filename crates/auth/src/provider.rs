//! Identity-provider boundary (transport-agnostic).
//!
//! The provider issues and validates sessions; this crate only consumes its
//! notifications. Session changes are pushed, not polled: implementations
//! broadcast a [`SessionEvent`] whenever a session is created, refreshed,
//! or destroyed, and the session store subscribes once at startup.

use async_trait::async_trait;
use tokio::sync::broadcast;

use integrador_core::DataResult;

use crate::Identity;

/// A session-change notification from the provider.
///
/// `session` carries the full principal when a session exists, `None` when
/// it does not (signed out, expired, or no stored session at startup).
#[derive(Debug, Clone)]
pub struct SessionEvent {
    pub session: Option<Identity>,
}

impl SessionEvent {
    pub fn established(identity: Identity) -> Self {
        Self {
            session: Some(identity),
        }
    }

    pub fn cleared() -> Self {
        Self { session: None }
    }
}

/// A live subscription to provider session events.
///
/// Dropping the subscription releases the underlying receiver; no explicit
/// unsubscribe call is needed.
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<SessionEvent>,
}

impl Subscription {
    pub fn new(receiver: broadcast::Receiver<SessionEvent>) -> Self {
        Self { receiver }
    }

    /// Wait for the next session event.
    pub async fn recv(&mut self) -> Result<SessionEvent, broadcast::error::RecvError> {
        self.receiver.recv().await
    }
}

/// External identity provider (sessions, credentials, sign-up).
///
/// Row-level authorization and token validation happen on the provider's
/// side; implementations translate provider failures into the shared
/// `DataError` taxonomy.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Subscribe to session-change notifications.
    fn subscribe(&self) -> Subscription;

    /// Authenticate with credentials, establishing a session.
    async fn sign_in(&self, email: &str, password: &str) -> DataResult<Identity>;

    /// Register a new account, establishing a session on success.
    async fn sign_up(&self, email: &str, password: &str) -> DataResult<Identity>;

    /// Invalidate the current session on the provider side.
    async fn sign_out(&self) -> DataResult<()>;

    /// Fetch the current session, if any.
    async fn current_session(&self) -> DataResult<Option<Identity>>;
}
