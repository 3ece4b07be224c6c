//! Profile of the acting user.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use integrador_auth::SessionStore;
use integrador_cache::{QueryCache, QueryKey};
use integrador_core::{DataError, DataResult, UserId};

use crate::remote::{Filter, PROFILES_TABLE, RemoteStore, decode};

pub const PROFILE_RESOURCE: &str = "profile";
/// Profiles change rarely; a short horizon keeps edits visible quickly.
pub const PROFILE_TTL: Duration = Duration::from_secs(60);

/// Row of the `profiles` table (backend-defined column names).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    #[serde(default)]
    pub apelido: Option<String>,
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default)]
    pub telefone: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub endereco: Option<String>,
    #[serde(default)]
    pub numero: Option<String>,
    #[serde(default)]
    pub bairro: Option<String>,
    #[serde(default)]
    pub cidade: Option<String>,
    #[serde(default)]
    pub uf: Option<String>,
    #[serde(default)]
    pub cep: Option<String>,
    #[serde(default)]
    pub cpf: Option<String>,
    #[serde(default)]
    pub cnh: Option<String>,
}

/// Fields a user may change on their own profile. The acting user's id is
/// injected by the service; absent fields are left untouched by the upsert.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apelido: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endereco: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numero: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bairro: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cep: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cnh: Option<String>,
}

/// Read/write access to the acting user's profile.
#[derive(Clone)]
pub struct ProfileService {
    remote: Arc<dyn RemoteStore>,
    cache: Arc<QueryCache>,
    session: Arc<SessionStore>,
}

impl ProfileService {
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        cache: Arc<QueryCache>,
        session: Arc<SessionStore>,
    ) -> Self {
        Self {
            remote,
            cache,
            session,
        }
    }

    pub fn key(user_id: UserId) -> QueryKey {
        QueryKey::scoped(PROFILE_RESOURCE, user_id)
    }

    /// Fetch the acting user's profile.
    ///
    /// `Ok(None)` both when unauthenticated (the read is disabled, no
    /// request is issued) and when the row does not exist yet — a profile
    /// created right after sign-up is a valid empty state, not an error.
    pub async fn get(&self) -> DataResult<Option<Profile>> {
        let Some(identity) = self.session.state().identity else {
            return Ok(None);
        };

        let key = Self::key(identity.id);
        let remote = Arc::clone(&self.remote);
        let user_id = identity.id;
        let value = self
            .cache
            .fetch(&key, PROFILE_TTL, move || {
                async move {
                    let filter = Filter::eq("id", user_id.to_string());
                    match remote.select_one(PROFILES_TABLE, &filter).await {
                        Ok(Some(row)) => Ok(row),
                        Ok(None) | Err(DataError::NotFound) => Ok(Value::Null),
                        Err(err) => Err(err),
                    }
                }
                .boxed()
            })
            .await?;

        decode::<Option<Profile>>(value)
    }

    /// Upsert the acting user's profile, invalidating its cache key.
    pub async fn update(&self, changes: ProfileChanges) -> DataResult<Profile> {
        let Some(identity) = self.session.state().identity else {
            return Err(DataError::auth("not signed in"));
        };

        let mut row = serde_json::to_value(&changes)
            .map_err(|e| DataError::validation(format!("profile changes: {e}")))?;
        row["id"] = Value::String(identity.id.to_string());

        let remote = Arc::clone(&self.remote);
        let updated = self
            .cache
            .mutate(
                async move { remote.upsert(PROFILES_TABLE, row, "id").await },
                &[Self::key(identity.id)],
            )
            .await?;

        decode(updated)
    }
}
