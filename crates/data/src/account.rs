//! Account flows: credential sign-in and tenant-creating sign-up.

use std::sync::Arc;

use serde_json::json;

use integrador_auth::{Identity, IdentityProvider};
use integrador_core::{DataResult, TenantId};

use crate::remote::{RemoteStore, SIGN_UP_TENANT_RPC, decode};

/// Payload of the new-tenant registration form.
#[derive(Debug, Clone, PartialEq)]
pub struct TenantRegistration {
    pub email: String,
    pub password: String,
    pub cnpj: String,
    pub corporate_name: String,
    pub city: String,
}

/// Credential and registration operations against the identity provider.
#[derive(Clone)]
pub struct AccountService {
    provider: Arc<dyn IdentityProvider>,
    remote: Arc<dyn RemoteStore>,
}

impl AccountService {
    pub fn new(provider: Arc<dyn IdentityProvider>, remote: Arc<dyn RemoteStore>) -> Self {
        Self { provider, remote }
    }

    /// Authenticate with credentials. The session store picks the new
    /// session up through the provider's notification; the identity is
    /// returned for immediate feedback on the sign-in form.
    pub async fn sign_in(&self, email: &str, password: &str) -> DataResult<Identity> {
        self.provider.sign_in(email, password).await
    }

    /// Register a new account and its owning organization.
    ///
    /// Two steps: provider sign-up (establishes the session), then the
    /// `sign_up_and_create_tenant` procedure creating the organization
    /// transactionally. A procedure failure leaves an account without a
    /// tenant; the error is propagated so the caller can surface it.
    pub async fn sign_up_tenant(&self, registration: TenantRegistration) -> DataResult<TenantId> {
        self.provider
            .sign_up(&registration.email, &registration.password)
            .await?;

        let params = json!({
            "org_cnpj": registration.cnpj,
            "org_corporate_name": registration.corporate_name,
            "org_city": registration.city,
        });
        let value = self.remote.rpc(SIGN_UP_TENANT_RPC, params).await?;
        let tenant_id: TenantId = decode(value)?;

        tracing::info!(%tenant_id, "tenant registered");
        Ok(tenant_id)
    }
}
