//! Remote-store boundary: keyed reads/writes against backend-defined rows.
//!
//! Row-level authorization lives behind this boundary and is never
//! replicated here; implementations translate backend failures into the
//! shared `DataError` taxonomy and hand rows over as JSON values.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use integrador_core::{DataError, DataResult};

pub const PROFILES_TABLE: &str = "profiles";
pub const ORGANIZATIONS_TABLE: &str = "organizations";

/// Procedure returning the profiles visible to the acting administrator.
pub const ADMIN_PROFILES_RPC: &str = "get_admin_profiles";
/// Procedure creating a user plus its owning organization atomically.
pub const SIGN_UP_TENANT_RPC: &str = "sign_up_and_create_tenant";

/// Equality filter on a single column.
///
/// The only filter shape this front-end needs; anything richer belongs to
/// the backend's procedures.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// External relational store fronted by row-level authorization.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Read a single row, `None` when no row matches (or policy hides it).
    async fn select_one(&self, table: &str, filter: &Filter) -> DataResult<Option<Value>>;

    /// Read all matching rows.
    async fn select_all(&self, table: &str, filter: Option<&Filter>) -> DataResult<Vec<Value>>;

    /// Patch matching rows, returning the updated row.
    async fn update(&self, table: &str, filter: &Filter, patch: Value) -> DataResult<Value>;

    /// Insert-or-update a row keyed on `on_conflict`, returning the row.
    async fn upsert(&self, table: &str, row: Value, on_conflict: &str) -> DataResult<Value>;

    /// Invoke a named procedure (cross-entity transactional operations).
    async fn rpc(&self, procedure: &str, params: Value) -> DataResult<Value>;
}

/// Decode a backend row into its typed shape.
pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> DataResult<T> {
    serde_json::from_value(value).map_err(|e| DataError::unknown(format!("malformed row: {e}")))
}
