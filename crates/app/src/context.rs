//! Application context: one object that owns the long-lived pieces.
//!
//! The shell creates a single [`AppContext`] at startup and hands clones of
//! the services to its views. The context wires the invariant the pieces
//! cannot enforce alone: cached reads never outlive the principal they were
//! fetched for.

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

use integrador_auth::provider::IdentityProvider;
use integrador_auth::session::{SessionState, SessionStore};
use integrador_cache::QueryCache;
use integrador_core::UserId;
use integrador_data::account::AccountService;
use integrador_data::organization::OrganizationService;
use integrador_data::profile::ProfileService;
use integrador_data::remote::RemoteStore;
use integrador_data::users::UsersService;

use crate::config::AppConfig;

/// Long-lived application state: session, cache, and the data services.
pub struct AppContext {
    config: AppConfig,
    session: Arc<SessionStore>,
    cache: Arc<QueryCache>,
    profiles: ProfileService,
    organizations: OrganizationService,
    users: UsersService,
    account: AccountService,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl AppContext {
    /// Build and start the context.
    ///
    /// Initializes logging, starts the session listener, and spawns the
    /// identity watcher that drops cached reads when the principal changes.
    pub fn init(
        config: AppConfig,
        provider: Arc<dyn IdentityProvider>,
        remote: Arc<dyn RemoteStore>,
    ) -> Arc<Self> {
        integrador_observability::init();

        let session = Arc::new(SessionStore::with_init_timeout(
            Arc::clone(&provider),
            config.session_timeout,
        ));
        session.initialize();

        let cache = Arc::new(QueryCache::new());

        let context = Arc::new(Self {
            config,
            profiles: ProfileService::new(
                Arc::clone(&remote),
                Arc::clone(&cache),
                Arc::clone(&session),
            ),
            organizations: OrganizationService::new(
                Arc::clone(&remote),
                Arc::clone(&cache),
                Arc::clone(&session),
            ),
            users: UsersService::new(Arc::clone(&remote), Arc::clone(&cache)),
            account: AccountService::new(provider, remote),
            session,
            cache,
            watcher: Mutex::new(None),
        });
        context.spawn_identity_watcher();
        context
    }

    /// Watch session transitions and keep the cache scoped to the current
    /// principal: a user switch invalidates everything, a sign-out clears
    /// everything.
    fn spawn_identity_watcher(self: &Arc<Self>) {
        let mut rx = self.session.subscribe();
        let cache = Arc::clone(&self.cache);
        let handle = tokio::spawn(async move {
            let mut last_user = current_user(&rx.borrow());
            while rx.changed().await.is_ok() {
                let user = current_user(&rx.borrow());
                if user == last_user {
                    continue;
                }
                match user {
                    Some(_) => {
                        tracing::debug!("principal changed; invalidating cached reads");
                        cache.invalidate_all();
                    }
                    None => {
                        tracing::debug!("signed out; clearing cached reads");
                        cache.clear();
                    }
                }
                last_user = user;
            }
        });
        *self.watcher.lock().expect("watcher lock poisoned") = Some(handle);
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn profiles(&self) -> &ProfileService {
        &self.profiles
    }

    pub fn organizations(&self) -> &OrganizationService {
        &self.organizations
    }

    pub fn users(&self) -> &UsersService {
        &self.users
    }

    pub fn account(&self) -> &AccountService {
        &self.account
    }

    /// Sign out and drop every cached read.
    ///
    /// The cache is cleared here as well as in the watcher so nothing
    /// stale survives even if the watcher task is gone.
    pub async fn sign_out(&self) {
        self.session.sign_out().await;
        self.cache.clear();
    }

    /// Stop the background tasks. Idempotent.
    pub fn dispose(&self) {
        if let Some(handle) = self.watcher.lock().expect("watcher lock poisoned").take() {
            handle.abort();
        }
        self.session.dispose();
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn current_user(state: &SessionState) -> Option<UserId> {
    state.identity.as_ref().map(|identity| identity.id)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
