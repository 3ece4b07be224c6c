//! Cache keys: logical resource name plus identifying parameter.

use std::borrow::Cow;

/// Stable identifier for one cached read.
///
/// Keys combine a resource name with the parameter that scopes it (the
/// acting user for a profile, the tenant for an organization). Resource-wide
/// reads (the admin user list) carry no parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    resource: Cow<'static, str>,
    param: Option<String>,
}

impl QueryKey {
    pub fn new(resource: impl Into<Cow<'static, str>>, param: Option<String>) -> Self {
        Self {
            resource: resource.into(),
            param,
        }
    }

    /// Key scoped by an identifying parameter.
    pub fn scoped(resource: impl Into<Cow<'static, str>>, param: impl ToString) -> Self {
        Self::new(resource, Some(param.to_string()))
    }

    /// Resource-wide key with no identifying parameter.
    pub fn global(resource: impl Into<Cow<'static, str>>) -> Self {
        Self::new(resource, None)
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn param(&self) -> Option<&str> {
        self.param.as_deref()
    }
}

impl core::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.param {
            Some(param) => write!(f, "{}:{}", self.resource, param),
            None => f.write_str(&self.resource),
        }
    }
}
