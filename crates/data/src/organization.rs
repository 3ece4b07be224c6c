//! Organization (tenant) settings.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use integrador_auth::SessionStore;
use integrador_cache::{QueryCache, QueryKey};
use integrador_core::{DataError, DataResult, TenantId};

use crate::remote::{Filter, ORGANIZATIONS_TABLE, RemoteStore, decode};

pub const ORGANIZATION_RESOURCE: &str = "organization";
/// Organization settings change rarely.
pub const ORGANIZATION_TTL: Duration = Duration::from_secs(300);

/// Row of the `organizations` table (backend-defined column names).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: TenantId,
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default)]
    pub nome_fantasia: Option<String>,
    /// CNPJ (legal document number).
    #[serde(default)]
    pub documento: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub numero_telefone: Option<String>,
    #[serde(default)]
    pub cep: Option<String>,
    #[serde(default)]
    pub logradouro: Option<String>,
    #[serde(default)]
    pub numero: Option<String>,
    #[serde(default)]
    pub complemento: Option<String>,
    #[serde(default)]
    pub cidade: Option<String>,
    #[serde(default)]
    pub estado: Option<String>,
    #[serde(default)]
    pub bairro: Option<String>,
}

/// Fields an administrator may change on the tenant. The tenant id comes
/// from the session, never from the payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrganizationChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nome_fantasia: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numero_telefone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cep: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logradouro: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numero: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complemento: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bairro: Option<String>,
}

/// Read/write access to the acting user's tenant settings.
#[derive(Clone)]
pub struct OrganizationService {
    remote: Arc<dyn RemoteStore>,
    cache: Arc<QueryCache>,
    session: Arc<SessionStore>,
}

impl OrganizationService {
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

    pub fn key(tenant_id: TenantId) -> QueryKey {
        QueryKey::scoped(ORGANIZATION_RESOURCE, tenant_id)
    }

    fn tenant_id(&self) -> Option<TenantId> {
        self.session.state().identity.and_then(|i| i.tenant_id)
    }

    /// Fetch the tenant's organization row.
    ///
    /// `Ok(None)` when the identity carries no tenant (the read is
    /// disabled), when the row is absent, and when row-level policy hides
    /// it — all are rendered as "no organization", not as errors.
    pub async fn get(&self) -> DataResult<Option<Organization>> {
        let Some(tenant_id) = self.tenant_id() else {
            return Ok(None);
        };

        let key = Self::key(tenant_id);
        let remote = Arc::clone(&self.remote);
        let value = self
            .cache
            .fetch(&key, ORGANIZATION_TTL, move || {
                async move {
                    let filter = Filter::eq("id", tenant_id.to_string());
                    match remote.select_one(ORGANIZATIONS_TABLE, &filter).await {
                        Ok(Some(row)) => Ok(row),
                        Ok(None) | Err(DataError::NotFound) => Ok(Value::Null),
                        Err(DataError::Forbidden(reason)) => {
                            tracing::warn!(%tenant_id, reason, "organization hidden by policy");
                            Ok(Value::Null)
                        }
                        Err(err) => Err(err),
                    }
                }
                .boxed()
            })
            .await?;

        decode::<Option<Organization>>(value)
    }

    /// Update the tenant's settings, invalidating its cache key on success.
    pub async fn update(&self, changes: OrganizationChanges) -> DataResult<Organization> {
        let Some(tenant_id) = self.tenant_id() else {
            return Err(DataError::auth("no tenant in session"));
        };

        let patch = serde_json::to_value(&changes)
            .map_err(|e| DataError::validation(format!("organization changes: {e}")))?;

        let remote = Arc::clone(&self.remote);
        let updated = self
            .cache
            .mutate(
                async move {
                    let filter = Filter::eq("id", tenant_id.to_string());
                    remote.update(ORGANIZATIONS_TABLE, &filter, patch).await
                },
                &[Self::key(tenant_id)],
            )
            .await?;

        decode(updated)
    }
}
