//! Non-blocking view of a cached read.

use serde_json::Value;

use integrador_core::DataError;

/// Observable status of a cached read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Nothing requested for this key yet (or the read is disabled because
    /// its identity parameter is unavailable): no value, not loading.
    Idle,
    /// A fetch is in flight.
    Loading,
    /// A value is available (fresh, or stale awaiting the next read).
    Success,
    /// The last fetch failed and no value is cached.
    Error,
}

/// Snapshot of a cache entry for callers that render without awaiting.
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub data: Option<Value>,
    pub status: QueryStatus,
    pub error: Option<DataError>,
}

impl QueryResult {
    pub fn idle() -> Self {
        Self {
            data: None,
            status: QueryStatus::Idle,
            error: None,
        }
    }

    pub fn loading(data: Option<Value>) -> Self {
        Self {
            data,
            status: QueryStatus::Loading,
            error: None,
        }
    }

    pub fn success(data: Value) -> Self {
        Self {
            data: Some(data),
            status: QueryStatus::Success,
            error: None,
        }
    }

    pub fn error(error: DataError) -> Self {
        Self {
            data: None,
            status: QueryStatus::Error,
            error: Some(error),
        }
    }
}
