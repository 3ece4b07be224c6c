//! Tenant user administration (list of visible profiles).

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::json;

use integrador_cache::{QueryCache, QueryKey};
use integrador_core::{DataResult, UserId};

use crate::remote::{ADMIN_PROFILES_RPC, RemoteStore, decode};

pub const USERS_RESOURCE: &str = "admin_profiles";
/// Always refetched: the list must reflect membership changes immediately.
/// Concurrent reads still collapse into one call.
pub const USERS_TTL: Duration = Duration::ZERO;

/// One row of the administrator-visible user list, as returned by the
/// `get_admin_profiles` procedure (visibility is enforced inside it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default)]
    pub apelido: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub telefone: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Listing of the users the acting administrator may see.
#[derive(Clone)]
pub struct UsersService {
    remote: Arc<dyn RemoteStore>,
    cache: Arc<QueryCache>,
}

impl UsersService {
    pub fn new(remote: Arc<dyn RemoteStore>, cache: Arc<QueryCache>) -> Self {
        Self { remote, cache }
    }

    pub fn key() -> QueryKey {
        QueryKey::global(USERS_RESOURCE)
    }

    /// List the visible users. Row-level visibility is applied inside the
    /// backend procedure; a denial surfaces as the procedure's error.
    pub async fn list(&self) -> DataResult<Vec<UserSummary>> {
        let remote = Arc::clone(&self.remote);
        let value = self
            .cache
            .fetch(&Self::key(), USERS_TTL, move || {
                async move { remote.rpc(ADMIN_PROFILES_RPC, json!({})).await }.boxed()
            })
            .await?;

        decode(value)
    }
}
