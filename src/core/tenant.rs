//! Tenant identity and the scope wrapper threaded through every operation.
//!
//! All reads and writes in the core are confined to a single tenant. The
//! scope is constructed once per request from the validated context and
//! passed by value; there is no shared mutable tenant state.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{CoreError, CoreResult};

/// Opaque tenant identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TenantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A validated tenant scope.
///
/// Construction is the single place a missing tenant is rejected;
/// everything downstream can rely on the tenant being present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantScope {
    tenant: TenantId,
}

impl TenantScope {
    pub fn new(tenant: TenantId) -> Self {
        Self { tenant }
    }

    /// Build a scope from an optional context tenant.
    pub fn from_context(tenant: Option<&TenantId>) -> CoreResult<Self> {
        tenant
            .cloned()
            .map(|tenant| Self { tenant })
            .ok_or_else(CoreError::missing_tenant)
    }

    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    /// Verify that `other` belongs to this scope.
    pub fn ensure(&self, other: &TenantId) -> CoreResult<()> {
        if &self.tenant == other {
            Ok(())
        } else {
            Err(CoreError::cross_tenant(format!(
                "tenant {} cannot access data owned by {}",
                self.tenant, other
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_from_context_requires_tenant() {
        let err = TenantScope::from_context(None).unwrap_err();
        assert_eq!(err.kind(), "MissingTenant");

        let t = TenantId::from("t1");
        let scope = TenantScope::from_context(Some(&t)).unwrap();
        assert_eq!(scope.tenant(), &t);
    }

    #[test]
    fn test_ensure_rejects_foreign_tenant() {
        let scope = TenantScope::new(TenantId::from("t1"));
        assert!(scope.ensure(&TenantId::from("t1")).is_ok());

        let err = scope.ensure(&TenantId::from("t2")).unwrap_err();
        assert_eq!(err.kind(), "CrossTenant");
    }
}
