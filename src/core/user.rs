//! Users and role bindings, owned by the external identity subsystem.

use serde::{Deserialize, Serialize};

use super::ids::UserId;
use super::tenant::TenantId;

/// A user account inside one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub tenant: TenantId,
    pub username: String,
    pub display_name: String,
    pub email: Option<String>,
    pub active: bool,
}

/// An RBAC binding of a user to a named role.
///
/// Exactly one active binding per user is expected; zero or more are
/// tolerated and the gate fails closed without one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleBinding {
    pub user: UserId,
    pub role: String,
    #[serde(default)]
    pub view_all_event: bool,
    #[serde(default)]
    pub view_module_event: bool,
    #[serde(default)]
    pub accessible_modules: Vec<String>,
    pub active: bool,
}
