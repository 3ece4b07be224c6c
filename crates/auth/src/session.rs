//! Session store: the single source of truth for "who is logged in".

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::provider::IdentityProvider;
use crate::{Identity, SessionEvent};

/// Bounded wait for the provider's first session check. Without it a
/// provider that never answers would leave the UI on a spinner forever.
pub const DEFAULT_INIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Current session snapshot.
///
/// # Invariants
/// - `initializing` transitions true→false exactly once per store lifetime:
///   on the first provider notification, or on the bounded-wait timeout.
/// - `identity` is only ever replaced wholesale (provider notification or
///   sign-out), never mutated field by field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub identity: Option<Identity>,
    pub initializing: bool,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Apply a provider notification.
    ///
    /// Idempotent under repeated identical notifications. Clears
    /// `initializing` regardless of outcome — the first notification ends
    /// the initializing phase even when the user is unauthenticated.
    pub fn apply_event(&mut self, session: Option<Identity>) {
        self.identity = session;
        self.initializing = false;
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            identity: None,
            initializing: true,
        }
    }
}

/// Process-wide session store.
///
/// Subscribes to provider session events and republishes them as
/// [`SessionState`] through a watch channel. View code never writes the
/// identity directly; the only mutation paths are the listener task and
/// [`SessionStore::sign_out`].
pub struct SessionStore {
    provider: Arc<dyn IdentityProvider>,
    state: watch::Sender<SessionState>,
    listener: Mutex<Option<JoinHandle<()>>>,
    init_timeout: Duration,
}

impl SessionStore {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self::with_init_timeout(provider, DEFAULT_INIT_TIMEOUT)
    }

    pub fn with_init_timeout(provider: Arc<dyn IdentityProvider>, init_timeout: Duration) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            provider,
            state,
            listener: Mutex::new(None),
            init_timeout,
        }
    }

    /// Begin listening for provider session notifications.
    ///
    /// Non-blocking: spawns the listener task and returns immediately.
    /// Calling it twice is a logged no-op.
    pub fn initialize(self: &Arc<Self>) {
        let mut guard = self.listener.lock().expect("listener lock poisoned");
        if guard.is_some() {
            tracing::warn!("session store already initialized");
            return;
        }

        let mut subscription = self.provider.subscribe();
        let store = Arc::clone(self);
        *guard = Some(tokio::spawn(async move {
            // First check is bounded; a timeout still resolves `initializing`.
            match tokio::time::timeout(store.init_timeout, subscription.recv()).await {
                Ok(event) => store.on_provider_event(event),
                Err(_) => {
                    tracing::warn!(
                        timeout = ?store.init_timeout,
                        "no session notification within bounded wait; treating as signed out"
                    );
                    store.state.send_modify(|s| s.initializing = false);
                }
            }

            loop {
                match subscription.recv().await {
                    Ok(event) => store.apply_session(event.session),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "session events lagged; resyncing from provider");
                        match store.provider.current_session().await {
                            Ok(session) => store.apply_session(session),
                            Err(err) => {
                                tracing::error!(error = %err, "session resync failed")
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));
    }

    fn on_provider_event(&self, event: Result<SessionEvent, broadcast::error::RecvError>) {
        match event {
            Ok(event) => self.apply_session(event.session),
            Err(err) => {
                // Notification errors are logged, never thrown; the store
                // must not stay stuck in `initializing`.
                tracing::error!(error = %err, "provider session notification failed");
                self.state.send_modify(|s| s.initializing = false);
            }
        }
    }

    fn apply_session(&self, session: Option<Identity>) {
        self.state.send_modify(|s| s.apply_event(session));
    }

    /// Current state snapshot.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Observe state changes (gate, app shell, invalidation watcher).
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Sign out: provider-side invalidation first, then local teardown.
    ///
    /// The provider call is awaited before clearing local state so a
    /// concurrent reload cannot observe a stale authenticated session. The
    /// local identity is cleared even when the provider call fails —
    /// fail-open to logged-out, never fail-closed to logged-in.
    pub async fn sign_out(&self) {
        let result = self.provider.sign_out().await;
        self.state.send_modify(|s| {
            s.identity = None;
            s.initializing = false;
        });
        if let Err(err) = result {
            tracing::error!(error = %err, "provider sign-out failed; local session cleared anyway");
        }
    }

    /// Release the provider subscription and stop the listener task.
    pub fn dispose(&self) {
        if let Some(handle) = self.listener.lock().expect("listener lock poisoned").take() {
            handle.abort();
        }
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.dispose();
    }
}
