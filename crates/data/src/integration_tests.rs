//! Service-level tests against mock provider/store implementations.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::broadcast;

use integrador_auth::{Identity, IdentityProvider, SessionEvent, SessionStore, Subscription};
use integrador_cache::QueryCache;
use integrador_core::{DataError, DataResult, TenantId, UserId};

use crate::account::{AccountService, TenantRegistration};
use crate::organization::{OrganizationChanges, OrganizationService};
use crate::profile::{ProfileChanges, ProfileService};
use crate::remote::{Filter, RemoteStore};
use crate::users::UsersService;

type CallLog = Arc<Mutex<Vec<String>>>;

/// In-memory remote store. Rows are keyed by (table, id); every call takes
/// a short detour through the scheduler so concurrent reads genuinely
/// overlap in current-thread test runtimes.
struct MockRemote {
    rows: Mutex<HashMap<(String, String), Value>>,
    rpc_results: Mutex<HashMap<String, DataResult<Value>>>,
    select_error: Mutex<Option<DataError>>,
    update_error: Mutex<Option<DataError>>,
    select_calls: AtomicUsize,
    update_calls: AtomicUsize,
    upsert_calls: AtomicUsize,
    rpc_calls: AtomicUsize,
    log: CallLog,
}

impl MockRemote {
    fn new(log: CallLog) -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            rpc_results: Mutex::new(HashMap::new()),
            select_error: Mutex::new(None),
            update_error: Mutex::new(None),
            select_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
            upsert_calls: AtomicUsize::new(0),
            rpc_calls: AtomicUsize::new(0),
            log,
        }
    }

    fn with_row(self, table: &str, id: &str, row: Value) -> Self {
        self.rows
            .lock()
            .unwrap()
            .insert((table.to_string(), id.to_string()), row);
        self
    }

    fn with_rpc(self, procedure: &str, result: DataResult<Value>) -> Self {
        self.rpc_results
            .lock()
            .unwrap()
            .insert(procedure.to_string(), result);
        self
    }

    fn with_select_error(self, error: DataError) -> Self {
        *self.select_error.lock().unwrap() = Some(error);
        self
    }

    fn with_update_error(self, error: DataError) -> Self {
        *self.update_error.lock().unwrap() = Some(error);
        self
    }
}

fn merge_object(target: &mut Value, patch: &Value) {
    if let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
    }
}

#[async_trait]
impl RemoteStore for MockRemote {
    async fn select_one(&self, table: &str, filter: &Filter) -> DataResult<Option<Value>> {
        self.select_calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(format!("select:{table}"));
        tokio::time::sleep(Duration::from_millis(5)).await;

        if let Some(err) = self.select_error.lock().unwrap().clone() {
            return Err(err);
        }
        let id = filter.value.as_str().unwrap_or_default().to_string();
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(&(table.to_string(), id))
            .cloned())
    }

    async fn select_all(&self, table: &str, _filter: Option<&Filter>) -> DataResult<Vec<Value>> {
        self.log.lock().unwrap().push(format!("select_all:{table}"));
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|((t, _), _)| t == table)
            .map(|(_, row)| row.clone())
            .collect())
    }

    async fn update(&self, table: &str, filter: &Filter, patch: Value) -> DataResult<Value> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(format!("update:{table}"));
        tokio::time::sleep(Duration::from_millis(5)).await;

        if let Some(err) = self.update_error.lock().unwrap().clone() {
            return Err(err);
        }
        let id = filter.value.as_str().unwrap_or_default().to_string();
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(&(table.to_string(), id))
            .ok_or(DataError::NotFound)?;
        merge_object(row, &patch);
        Ok(row.clone())
    }

    async fn upsert(&self, table: &str, row: Value, on_conflict: &str) -> DataResult<Value> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(format!("upsert:{table}"));
        tokio::time::sleep(Duration::from_millis(5)).await;

        let id = row[on_conflict].as_str().unwrap_or_default().to_string();
        let mut rows = self.rows.lock().unwrap();
        let stored = rows
            .entry((table.to_string(), id))
            .or_insert_with(|| json!({}));
        merge_object(stored, &row);
        Ok(stored.clone())
    }

    async fn rpc(&self, procedure: &str, _params: Value) -> DataResult<Value> {
        self.rpc_calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(format!("rpc:{procedure}"));
        tokio::time::sleep(Duration::from_millis(5)).await;

        self.rpc_results
            .lock()
            .unwrap()
            .get(procedure)
            .cloned()
            .unwrap_or_else(|| Err(DataError::unknown(format!("unscripted rpc {procedure}"))))
    }
}

struct MockProvider {
    tx: broadcast::Sender<SessionEvent>,
    sign_in_result: Mutex<DataResult<Identity>>,
    sign_up_result: Mutex<DataResult<Identity>>,
    log: CallLog,
}

impl MockProvider {
    fn new(log: CallLog) -> Self {
        let (tx, _) = broadcast::channel(16);
        Self {
            tx,
            sign_in_result: Mutex::new(Err(DataError::auth("unscripted"))),
            sign_up_result: Mutex::new(Err(DataError::auth("unscripted"))),
            log,
        }
    }

    fn with_sign_in(self, result: DataResult<Identity>) -> Self {
        *self.sign_in_result.lock().unwrap() = result;
        self
    }

    fn with_sign_up(self, result: DataResult<Identity>) -> Self {
        *self.sign_up_result.lock().unwrap() = result;
        self
    }

    fn emit(&self, session: Option<Identity>) {
        self.tx.send(SessionEvent { session }).expect("no subscriber");
    }
}

#[async_trait]
impl IdentityProvider for MockProvider {
    fn subscribe(&self) -> Subscription {
        Subscription::new(self.tx.subscribe())
    }

    async fn sign_in(&self, _email: &str, _password: &str) -> DataResult<Identity> {
        self.log.lock().unwrap().push("sign_in".to_string());
        self.sign_in_result.lock().unwrap().clone()
    }

    async fn sign_up(&self, _email: &str, _password: &str) -> DataResult<Identity> {
        self.log.lock().unwrap().push("sign_up".to_string());
        self.sign_up_result.lock().unwrap().clone()
    }

    async fn sign_out(&self) -> DataResult<()> {
        Ok(())
    }

    async fn current_session(&self) -> DataResult<Option<Identity>> {
        Ok(None)
    }
}

async fn session_with(provider: Arc<MockProvider>, identity: Option<Identity>) -> Arc<SessionStore> {
    let store = Arc::new(SessionStore::new(provider.clone() as Arc<dyn IdentityProvider>));
    store.initialize();
    provider.emit(identity);
    let mut rx = store.subscribe();
    tokio::time::timeout(Duration::from_secs(1), rx.wait_for(|s| !s.initializing))
        .await
        .expect("session init timed out")
        .expect("store dropped");
    store
}

fn log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

fn user_with_tenant() -> (Identity, UserId, TenantId) {
    let user_id = UserId::new();
    let tenant_id = TenantId::new();
    let identity = Identity::new(user_id, "ana@example.com").with_tenant(tenant_id);
    (identity, user_id, tenant_id)
}

// ─────────────────────────────────────────────────────────────────────────────
// Profile
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn profile_read_is_disabled_when_unauthenticated() {
    let log = log();
    let remote = Arc::new(MockRemote::new(log.clone()));
    let session = session_with(Arc::new(MockProvider::new(log)), None).await;
    let service = ProfileService::new(remote.clone(), Arc::new(QueryCache::new()), session);

    assert_eq!(service.get().await.unwrap(), None);
    assert_eq!(remote.select_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn profile_absence_is_a_valid_empty_state() {
    let log = log();
    let (identity, _, _) = user_with_tenant();
    let remote = Arc::new(MockRemote::new(log.clone()));
    let session = session_with(Arc::new(MockProvider::new(log)), Some(identity)).await;
    let service = ProfileService::new(remote.clone(), Arc::new(QueryCache::new()), session);

    // No row yet (freshly signed-up user): empty state, not an error.
    assert_eq!(service.get().await.unwrap(), None);
    assert_eq!(remote.select_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn profile_not_found_error_maps_to_empty_state() {
    let log = log();
    let (identity, _, _) = user_with_tenant();
    let remote = Arc::new(MockRemote::new(log.clone()).with_select_error(DataError::NotFound));
    let session = session_with(Arc::new(MockProvider::new(log)), Some(identity)).await;
    let service = ProfileService::new(remote, Arc::new(QueryCache::new()), session);

    assert_eq!(service.get().await.unwrap(), None);
}

#[tokio::test]
async fn concurrent_profile_reads_collapse_into_one_select() {
    let log = log();
    let (identity, user_id, _) = user_with_tenant();
    let remote = Arc::new(MockRemote::new(log.clone()).with_row(
        "profiles",
        &user_id.to_string(),
        json!({"id": user_id.to_string(), "nome": "Ana"}),
    ));
    let session = session_with(Arc::new(MockProvider::new(log)), Some(identity)).await;
    let service = ProfileService::new(remote.clone(), Arc::new(QueryCache::new()), session);

    let first = {
        let service = service.clone();
        tokio::spawn(async move { service.get().await })
    };
    let second = {
        let service = service.clone();
        tokio::spawn(async move { service.get().await })
    };

    let first = first.await.unwrap().unwrap().unwrap();
    let second = second.await.unwrap().unwrap().unwrap();
    assert_eq!(first.nome.as_deref(), Some("Ana"));
    assert_eq!(first, second);
    assert_eq!(remote.select_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn profile_update_invalidates_the_profile_key() {
    let log = log();
    let (identity, user_id, _) = user_with_tenant();
    let remote = Arc::new(MockRemote::new(log.clone()).with_row(
        "profiles",
        &user_id.to_string(),
        json!({"id": user_id.to_string(), "nome": "Ana"}),
    ));
    let session = session_with(Arc::new(MockProvider::new(log)), Some(identity)).await;
    let service = ProfileService::new(remote.clone(), Arc::new(QueryCache::new()), session);

    assert_eq!(
        service.get().await.unwrap().unwrap().nome.as_deref(),
        Some("Ana")
    );

    let updated = service
        .update(ProfileChanges {
            nome: Some("Ana Souza".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(updated.nome.as_deref(), Some("Ana Souza"));

    // Invalidation forces a refetch that sees the new row.
    assert_eq!(
        service.get().await.unwrap().unwrap().nome.as_deref(),
        Some("Ana Souza")
    );
    assert_eq!(remote.select_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn profile_update_requires_a_session() {
    let log = log();
    let remote = Arc::new(MockRemote::new(log.clone()));
    let session = session_with(Arc::new(MockProvider::new(log)), None).await;
    let service = ProfileService::new(remote.clone(), Arc::new(QueryCache::new()), session);

    let err = service.update(ProfileChanges::default()).await.unwrap_err();
    assert!(matches!(err, DataError::Auth(_)));
    assert_eq!(remote.upsert_calls.load(Ordering::SeqCst), 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Organization
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn organization_read_is_disabled_without_a_tenant() {
    let log = log();
    let identity = Identity::new(UserId::new(), "ana@example.com"); // no tenant yet
    let remote = Arc::new(MockRemote::new(log.clone()));
    let session = session_with(Arc::new(MockProvider::new(log)), Some(identity)).await;
    let service = OrganizationService::new(remote.clone(), Arc::new(QueryCache::new()), session);

    assert_eq!(service.get().await.unwrap(), None);
    assert_eq!(remote.select_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn organization_hidden_by_policy_reads_as_none() {
    let log = log();
    let (identity, _, _) = user_with_tenant();
    let remote = Arc::new(
        MockRemote::new(log.clone()).with_select_error(DataError::forbidden("rls denied")),
    );
    let session = session_with(Arc::new(MockProvider::new(log)), Some(identity)).await;
    let service = OrganizationService::new(remote, Arc::new(QueryCache::new()), session);

    assert_eq!(service.get().await.unwrap(), None);
}

#[tokio::test]
async fn organization_update_then_read_returns_the_new_name() {
    let log = log();
    let (identity, _, tenant_id) = user_with_tenant();
    let remote = Arc::new(MockRemote::new(log.clone()).with_row(
        "organizations",
        &tenant_id.to_string(),
        json!({"id": tenant_id.to_string(), "nome": "Acme Ltda"}),
    ));
    let session = session_with(Arc::new(MockProvider::new(log)), Some(identity)).await;
    let service = OrganizationService::new(remote.clone(), Arc::new(QueryCache::new()), session);

    let before = service.get().await.unwrap().unwrap();
    assert_eq!(before.nome.as_deref(), Some("Acme Ltda"));

    service
        .update(OrganizationChanges {
            nome: Some("Nova Razão".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    let after = service.get().await.unwrap().unwrap();
    assert_eq!(after.nome.as_deref(), Some("Nova Razão"));
    assert_eq!(remote.select_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn organization_update_failure_leaves_the_cache_untouched() {
    let log = log();
    let (identity, _, tenant_id) = user_with_tenant();
    let remote = Arc::new(
        MockRemote::new(log.clone())
            .with_row(
                "organizations",
                &tenant_id.to_string(),
                json!({"id": tenant_id.to_string(), "nome": "Acme Ltda"}),
            )
            .with_update_error(DataError::validation("nome cannot be empty")),
    );
    let session = session_with(Arc::new(MockProvider::new(log)), Some(identity)).await;
    let service = OrganizationService::new(remote.clone(), Arc::new(QueryCache::new()), session);

    service.get().await.unwrap();

    let err = service
        .update(OrganizationChanges {
            nome: Some(String::new()),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DataError::Validation(_)));

    // Still served fresh from cache, no refetch after the failed write.
    let cached = service.get().await.unwrap().unwrap();
    assert_eq!(cached.nome.as_deref(), Some("Acme Ltda"));
    assert_eq!(remote.select_calls.load(Ordering::SeqCst), 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

fn admin_profiles_row(user_id: UserId) -> Value {
    json!([{
        "id": user_id.to_string(),
        "nome": "Ana",
        "apelido": "ana",
        "email": "ana@example.com",
        "role": "admin",
    }])
}

#[tokio::test]
async fn users_list_refetches_on_every_read() {
    let log = log();
    let user_id = UserId::new();
    let remote = Arc::new(
        MockRemote::new(log.clone())
            .with_rpc("get_admin_profiles", Ok(admin_profiles_row(user_id))),
    );
    let service = UsersService::new(remote.clone(), Arc::new(QueryCache::new()));

    let users = service.list().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].id, user_id);

    service.list().await.unwrap();
    assert_eq!(remote.rpc_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn concurrent_users_lists_collapse_into_one_call() {
    let log = log();
    let remote = Arc::new(
        MockRemote::new(log.clone())
            .with_rpc("get_admin_profiles", Ok(admin_profiles_row(UserId::new()))),
    );
    let service = UsersService::new(remote.clone(), Arc::new(QueryCache::new()));

    let first = {
        let service = service.clone();
        tokio::spawn(async move { service.list().await })
    };
    let second = {
        let service = service.clone();
        tokio::spawn(async move { service.list().await })
    };

    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();
    assert_eq!(remote.rpc_calls.load(Ordering::SeqCst), 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Account
// ─────────────────────────────────────────────────────────────────────────────

fn registration() -> TenantRegistration {
    TenantRegistration {
        email: "dono@example.com".to_string(),
        password: "s3cret!".to_string(),
        cnpj: "12.345.678/0001-90".to_string(),
        corporate_name: "Acme Ltda".to_string(),
        city: "São Paulo".to_string(),
    }
}

#[tokio::test]
async fn sign_up_creates_the_account_before_the_tenant() {
    let log = log();
    let tenant_id = TenantId::new();
    let identity = Identity::new(UserId::new(), "dono@example.com");
    let provider = Arc::new(MockProvider::new(log.clone()).with_sign_up(Ok(identity)));
    let remote = Arc::new(
        MockRemote::new(log.clone()).with_rpc(
            "sign_up_and_create_tenant",
            Ok(json!(tenant_id.to_string())),
        ),
    );
    let service = AccountService::new(provider, remote);

    let created = service.sign_up_tenant(registration()).await.unwrap();
    assert_eq!(created, tenant_id);
    assert_eq!(
        log.lock().unwrap().as_slice(),
        ["sign_up", "rpc:sign_up_and_create_tenant"]
    );
}

#[tokio::test]
async fn sign_up_propagates_a_tenant_rpc_failure() {
    let log = log();
    let identity = Identity::new(UserId::new(), "dono@example.com");
    let provider = Arc::new(MockProvider::new(log.clone()).with_sign_up(Ok(identity)));
    let remote = Arc::new(MockRemote::new(log.clone()).with_rpc(
        "sign_up_and_create_tenant",
        Err(DataError::validation("CNPJ já cadastrado")),
    ));
    let service = AccountService::new(provider, remote);

    let err = service.sign_up_tenant(registration()).await.unwrap_err();
    assert_eq!(err, DataError::validation("CNPJ já cadastrado"));
    // The account was created; the caller decides how to surface the orphan.
    assert!(log.lock().unwrap().contains(&"sign_up".to_string()));
}

#[tokio::test]
async fn sign_up_stops_when_the_provider_rejects() {
    let log = log();
    let provider = Arc::new(
        MockProvider::new(log.clone()).with_sign_up(Err(DataError::auth("email already in use"))),
    );
    let remote = Arc::new(MockRemote::new(log.clone()));
    let service = AccountService::new(provider, remote.clone());

    let err = service.sign_up_tenant(registration()).await.unwrap_err();
    assert!(matches!(err, DataError::Auth(_)));
    assert_eq!(remote.rpc_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn sign_in_delegates_to_the_provider() {
    let log = log();
    let identity = Identity::new(UserId::new(), "ana@example.com");
    let provider = Arc::new(MockProvider::new(log.clone()).with_sign_in(Ok(identity.clone())));
    let service = AccountService::new(provider, Arc::new(MockRemote::new(log)));

    let signed_in = service.sign_in("ana@example.com", "s3cret!").await.unwrap();
    assert_eq!(signed_in, identity);
}
