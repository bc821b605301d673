//! Repository interface over the canonical entities.
//!
//! Every method is tenant-scoped: the tenant is a first-class argument
//! and implementations must never return rows belonging to another
//! tenant. The three exceptions are documented on the methods
//! themselves (tenant enumeration, approval lookup by opaque key, and
//! the row-ownership probe used for cross-tenant denial).

pub mod memory;
pub mod snapshot;
pub mod txn;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{
    Event, EventDraft, RecordId, Risk, RoleBinding, SourceKind, SourceRecord, TenantId, User,
    UserId,
};
use crate::errors::CoreResult;

pub use memory::{InMemoryRepo, SourceTxn};
pub use txn::{CommitHook, CommitQueue, SourceObserver};

/// Optional filters for risk listings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskFilter {
    pub entity: Option<String>,
    pub data: Option<String>,
    pub row: Option<String>,
}

impl RiskFilter {
    pub fn matches(&self, risk: &Risk) -> bool {
        self.entity.as_deref().is_none_or(|e| e == risk.entity)
            && self.data.as_deref().is_none_or(|d| d == risk.data)
            && self.row.as_deref().is_none_or(|r| r == risk.row)
    }
}

/// One-based pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: usize,
    pub page_size: usize,
}

impl Page {
    pub const DEFAULT_SIZE: usize = 20;
    pub const MAX_SIZE: usize = 100;

    /// Normalize raw query values: page floors at 1, size is clamped.
    pub fn new(page: usize, page_size: usize) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, Self::MAX_SIZE),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page - 1) * self.page_size
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: Self::DEFAULT_SIZE,
        }
    }
}

/// A pending request to generate risks for one source selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub id: String,
    pub tenant: TenantId,
    pub entity: String,
    pub table: String,
    pub row: String,
}

/// Tenant-scoped repository over sources, events, risks, users, and
/// generic rows.
pub trait Repo: Send + Sync {
    // --- source records ---

    fn find_source(
        &self,
        tenant: &TenantId,
        kind: SourceKind,
        id: &RecordId,
    ) -> CoreResult<Option<SourceRecord>>;

    // --- events ---

    /// Insert a draft, assigning the numeric id, display id, and
    /// timestamps. Returns the persisted event.
    fn insert_event(&self, tenant: &TenantId, draft: EventDraft) -> CoreResult<Event>;

    fn update_event(&self, tenant: &TenantId, event: &Event) -> CoreResult<()>;

    /// Find an open event for the given record whose title contains
    /// `title_hint` (case-insensitive). This is the dedup query.
    fn find_open_event(
        &self,
        tenant: &TenantId,
        kind: SourceKind,
        id: &RecordId,
        title_hint: &str,
    ) -> CoreResult<Option<Event>>;

    /// Events of the given kinds, newest first.
    fn list_events_by_kinds(
        &self,
        tenant: &TenantId,
        kinds: &[SourceKind],
    ) -> CoreResult<Vec<Event>>;

    // --- generated risks ---

    fn insert_risk(&self, tenant: &TenantId, risk: Risk) -> CoreResult<Risk>;

    fn list_risks(
        &self,
        tenant: &TenantId,
        filter: &RiskFilter,
        page: Page,
    ) -> CoreResult<Vec<Risk>>;

    fn count_risks(&self, tenant: &TenantId, filter: &RiskFilter) -> CoreResult<usize>;

    /// Next risk sequence number: `max(highest existing suffix, 999) + 1`.
    fn next_risk_sequence(&self, tenant: &TenantId) -> CoreResult<u32>;

    // --- scanner queries ---

    /// Approved risk instances whose mitigation due date has passed and
    /// whose mitigation is still outstanding.
    fn list_overdue_risks(
        &self,
        tenant: &TenantId,
        now: DateTime<Utc>,
    ) -> CoreResult<Vec<SourceRecord>>;

    /// Critical/High risk instances still unassigned, created within
    /// the window.
    fn list_high_priority_unassigned_risks(
        &self,
        tenant: &TenantId,
        now: DateTime<Utc>,
        within_days: i64,
    ) -> CoreResult<Vec<SourceRecord>>;

    /// Compliance items stuck under review for longer than `age_days`.
    fn list_stale_compliance(
        &self,
        tenant: &TenantId,
        now: DateTime<Utc>,
        age_days: i64,
    ) -> CoreResult<Vec<SourceRecord>>;

    // --- users and RBAC ---

    fn find_user(&self, tenant: &TenantId, id: &UserId) -> CoreResult<Option<User>>;

    /// The user's single active role binding, if any.
    fn active_role_binding(
        &self,
        tenant: &TenantId,
        user: &UserId,
    ) -> CoreResult<Option<RoleBinding>>;

    // --- generic rows (risk-synthesis sources) ---

    fn find_row(
        &self,
        tenant: &TenantId,
        table: &str,
        row_id: &str,
    ) -> CoreResult<Option<serde_json::Value>>;

    /// Which tenant owns `(table, row_id)`, across all tenants.
    ///
    /// Not tenant-scoped: this is the existence probe that lets callers
    /// distinguish a cross-tenant access attempt from a missing row.
    fn find_row_owner(&self, table: &str, row_id: &str) -> CoreResult<Option<TenantId>>;

    // --- approvals ---

    /// Look up an approval request by its opaque id.
    ///
    /// Not tenant-scoped: the caller must compare the returned tenant
    /// against its own scope before acting.
    fn find_approval(&self, approval_id: &str) -> CoreResult<Option<ApprovalRequest>>;

    // --- tenants ---

    /// All tenants with any stored data. Used by the periodic scanner.
    fn tenants(&self) -> CoreResult<Vec<TenantId>>;
}
