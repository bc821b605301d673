//! JSON snapshot fixtures: a declarative seed format for the in-memory
//! repository, used by the CLI and by integration tests.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::{RoleBinding, SourceRecord, TenantId, User};

use super::{ApprovalRequest, InMemoryRepo};

/// A role binding together with the tenant it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantRoleBinding {
    pub tenant: TenantId,
    #[serde(flatten)]
    pub binding: RoleBinding,
}

/// A generic row seed for risk-synthesis tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowSeed {
    pub tenant: TenantId,
    pub table: String,
    pub row: String,
    pub value: serde_json::Value,
}

/// Declarative repository contents.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub role_bindings: Vec<TenantRoleBinding>,
    #[serde(default)]
    pub sources: Vec<SourceRecord>,
    #[serde(default)]
    pub rows: Vec<RowSeed>,
    #[serde(default)]
    pub approvals: Vec<ApprovalRequest>,
}

impl Snapshot {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot {}", path.display()))?;
        Self::from_json(&raw)
            .with_context(|| format!("failed to parse snapshot {}", path.display()))
    }

    /// Seed a fresh repository with this snapshot's contents.
    pub fn into_repo(self) -> InMemoryRepo {
        let repo = InMemoryRepo::new();
        for user in self.users {
            repo.insert_user(user);
        }
        for entry in self.role_bindings {
            repo.insert_role_binding(&entry.tenant, entry.binding);
        }
        for record in self.sources {
            repo.seed_source(record);
        }
        for row in self.rows {
            repo.insert_row(&row.tenant, row.table, row.row, row.value);
        }
        for approval in self.approvals {
            repo.insert_approval(approval);
        }
        repo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SourceKind;
    use crate::repo::Repo;
    use indoc::indoc;

    #[test]
    fn test_snapshot_roundtrip_seeds_repo() {
        let json = indoc! {r#"
            {
              "users": [
                {
                  "id": "u1",
                  "tenant": "t1",
                  "username": "avery",
                  "display_name": "Avery Chen",
                  "email": "avery@example.com",
                  "active": true
                }
              ],
              "role_bindings": [
                {
                  "tenant": "t1",
                  "user": "u1",
                  "role": "Risk Manager",
                  "active": true
                }
              ],
              "rows": [
                {
                  "tenant": "t1",
                  "table": "temp_vendor",
                  "row": "v1",
                  "value": { "vendor_name": "Acme", "has_data_access": true }
                }
              ],
              "approvals": [
                {
                  "id": "ap-1",
                  "tenant": "t1",
                  "entity": "vendor_management",
                  "table": "temp_vendor",
                  "row": "v1"
                }
              ]
            }
        "#};

        let repo = Snapshot::from_json(json).unwrap().into_repo();
        let tenant = TenantId::from("t1");

        assert!(repo.find_user(&tenant, &"u1".into()).unwrap().is_some());
        assert!(repo
            .active_role_binding(&tenant, &"u1".into())
            .unwrap()
            .is_some());
        assert!(repo.find_row(&tenant, "temp_vendor", "v1").unwrap().is_some());
        assert!(repo.find_approval("ap-1").unwrap().is_some());
        assert!(repo
            .find_source(&tenant, SourceKind::Risk, &"missing".into())
            .unwrap()
            .is_none());
    }
}
