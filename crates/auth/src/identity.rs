//! Authenticated principal as reported by the identity provider.

use serde::{Deserialize, Serialize};

use integrador_core::{TenantId, UserId};

/// Principal attached to an active session.
///
/// Owned exclusively by the session store and replaced wholesale on every
/// provider notification — never mutated in place. The linking attributes
/// (`tenant_id`, `role`, …) come from the provider's app metadata and feed
/// cache-key construction in the data layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub email: String,
    /// Tenant the principal acts within. Absent for accounts that have not
    /// finished tenant onboarding.
    pub tenant_id: Option<TenantId>,
    pub role: Option<String>,
    pub display_name: Option<String>,
    pub phone: Option<String>,
}

impl Identity {
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            tenant_id: None,
            role: None,
            display_name: None,
            phone: None,
        }
    }

    pub fn with_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }
}
