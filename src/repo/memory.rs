//! In-memory reference implementation of the repository.
//!
//! A single `RwLock` guards the whole store. Source-record mutations go
//! through [`SourceTxn`], which stages writes, notifies lifecycle
//! observers, and runs the commit-hook queue only after the staged
//! writes have been applied and the lock released; hooks are therefore
//! free to re-enter the repository.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::core::{
    Event, EventDraft, EventId, RecordId, Risk, RoleBinding, SourceKind, SourceRecord, TenantId,
    User, UserId,
};
use crate::errors::{CoreError, CoreResult};
use crate::scoring;

use super::txn::{CommitQueue, SourceObserver};
use super::{ApprovalRequest, Page, Repo, RiskFilter};

#[derive(Default)]
struct TenantStore {
    sources: HashMap<(SourceKind, RecordId), SourceRecord>,
    events: Vec<Event>,
    risks: Vec<Risk>,
    users: HashMap<UserId, User>,
    bindings: Vec<RoleBinding>,
    rows: HashMap<(String, String), serde_json::Value>,
    next_event_id: u64,
}

#[derive(Default)]
struct Store {
    tenants: BTreeMap<TenantId, TenantStore>,
    approvals: HashMap<String, ApprovalRequest>,
}

/// Thread-safe in-memory repository.
#[derive(Default)]
pub struct InMemoryRepo {
    store: RwLock<Store>,
    observers: RwLock<Vec<Arc<dyn SourceObserver>>>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a lifecycle observer for source-record transactions.
    pub fn register_observer(&self, observer: Arc<dyn SourceObserver>) {
        self.observers.write().push(observer);
    }

    /// Begin a source-record transaction.
    pub fn begin(&self, tenant: &TenantId) -> SourceTxn<'_> {
        SourceTxn {
            repo: self,
            tenant: tenant.clone(),
            staged: Vec::new(),
            queue: CommitQueue::new(),
        }
    }

    // --- seeding (snapshot loading, webhook synthesis, tests) ---

    pub fn insert_user(&self, user: User) {
        let mut store = self.store.write();
        store
            .tenants
            .entry(user.tenant.clone())
            .or_default()
            .users
            .insert(user.id.clone(), user);
    }

    pub fn insert_role_binding(&self, tenant: &TenantId, binding: RoleBinding) {
        let mut store = self.store.write();
        store
            .tenants
            .entry(tenant.clone())
            .or_default()
            .bindings
            .push(binding);
    }

    pub fn insert_row(
        &self,
        tenant: &TenantId,
        table: impl Into<String>,
        row_id: impl Into<String>,
        value: serde_json::Value,
    ) {
        let mut store = self.store.write();
        store
            .tenants
            .entry(tenant.clone())
            .or_default()
            .rows
            .insert((table.into(), row_id.into()), value);
    }

    pub fn insert_approval(&self, approval: ApprovalRequest) {
        let mut store = self.store.write();
        store.approvals.insert(approval.id.clone(), approval);
    }

    /// Insert a source record directly, without notifying observers.
    ///
    /// Used for seeding and for webhook-synthesized records whose
    /// trigger is chosen by the caller.
    pub fn seed_source(&self, record: SourceRecord) {
        let mut store = self.store.write();
        store
            .tenants
            .entry(record.tenant.clone())
            .or_default()
            .sources
            .insert((record.kind, record.id.clone()), record);
    }

    fn with_tenant<T>(
        &self,
        tenant: &TenantId,
        f: impl FnOnce(&TenantStore) -> T,
        empty: T,
    ) -> T {
        let store = self.store.read();
        match store.tenants.get(tenant) {
            Some(ts) => f(ts),
            None => empty,
        }
    }

    fn apply(&self, tenant: &TenantId, staged: Vec<Staged>) {
        let mut store = self.store.write();
        let ts = store.tenants.entry(tenant.clone()).or_default();
        for write in staged {
            let record = match write {
                Staged::Insert(record) => record,
                Staged::Update { new, .. } => new,
            };
            ts.sources.insert((record.kind, record.id.clone()), record);
        }
    }
}

impl Repo for InMemoryRepo {
    fn find_source(
        &self,
        tenant: &TenantId,
        kind: SourceKind,
        id: &RecordId,
    ) -> CoreResult<Option<SourceRecord>> {
        Ok(self.with_tenant(
            tenant,
            |ts| ts.sources.get(&(kind, id.clone())).cloned(),
            None,
        ))
    }

    fn insert_event(&self, tenant: &TenantId, draft: EventDraft) -> CoreResult<Event> {
        if &draft.tenant != tenant {
            return Err(CoreError::cross_tenant(format!(
                "event draft for tenant {} inserted under {}",
                draft.tenant, tenant
            )));
        }
        let mut store = self.store.write();
        let ts = store.tenants.entry(tenant.clone()).or_default();
        if !ts
            .sources
            .contains_key(&(draft.linked_record_type, draft.linked_record_id.clone()))
        {
            return Err(CoreError::not_found(format!(
                "linked {} record {} not found in tenant {}",
                draft.linked_record_type, draft.linked_record_id, tenant
            )));
        }

        ts.next_event_id += 1;
        let id = ts.next_event_id;
        let sequence = ts
            .events
            .iter()
            .filter_map(|e| e.display_id.sequence())
            .max()
            .unwrap_or(0)
            + 1;
        let event = draft.into_event(id, EventId::from_sequence(sequence), Utc::now());
        ts.events.push(event.clone());
        Ok(event)
    }

    fn update_event(&self, tenant: &TenantId, event: &Event) -> CoreResult<()> {
        let mut store = self.store.write();
        let ts = store
            .tenants
            .get_mut(tenant)
            .ok_or_else(|| CoreError::not_found(format!("tenant {} has no events", tenant)))?;
        let slot = ts
            .events
            .iter_mut()
            .find(|e| e.id == event.id)
            .ok_or_else(|| CoreError::not_found(format!("event {} not found", event.id)))?;
        let mut updated = event.clone();
        updated.updated_at = Utc::now();
        *slot = updated;
        Ok(())
    }

    fn find_open_event(
        &self,
        tenant: &TenantId,
        kind: SourceKind,
        id: &RecordId,
        title_hint: &str,
    ) -> CoreResult<Option<Event>> {
        Ok(self.with_tenant(
            tenant,
            |ts| {
                ts.events
                    .iter()
                    .find(|e| {
                        e.linked_record_type == kind
                            && &e.linked_record_id == id
                            && e.status.is_open()
                            && e.title_contains(title_hint)
                    })
                    .cloned()
            },
            None,
        ))
    }

    fn list_events_by_kinds(
        &self,
        tenant: &TenantId,
        kinds: &[SourceKind],
    ) -> CoreResult<Vec<Event>> {
        let mut events = self.with_tenant(
            tenant,
            |ts| {
                ts.events
                    .iter()
                    .filter(|e| kinds.contains(&e.linked_record_type))
                    .cloned()
                    .collect::<Vec<_>>()
            },
            Vec::new(),
        );
        events.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(events)
    }

    fn insert_risk(&self, tenant: &TenantId, risk: Risk) -> CoreResult<Risk> {
        if &risk.tenant != tenant {
            return Err(CoreError::cross_tenant(format!(
                "risk for tenant {} inserted under {}",
                risk.tenant, tenant
            )));
        }
        let expected = scoring::score(risk.likelihood, risk.impact, risk.exposure);
        if risk.score != expected {
            return Err(CoreError::invalid_input(format!(
                "risk {} carries score {} but ratings derive {}",
                risk.id, risk.score, expected
            )));
        }
        let mut store = self.store.write();
        store
            .tenants
            .entry(tenant.clone())
            .or_default()
            .risks
            .push(risk.clone());
        Ok(risk)
    }

    fn list_risks(
        &self,
        tenant: &TenantId,
        filter: &RiskFilter,
        page: Page,
    ) -> CoreResult<Vec<Risk>> {
        Ok(self.with_tenant(
            tenant,
            |ts| {
                ts.risks
                    .iter()
                    .filter(|r| filter.matches(r))
                    .skip(page.offset())
                    .take(page.page_size)
                    .cloned()
                    .collect()
            },
            Vec::new(),
        ))
    }

    fn count_risks(&self, tenant: &TenantId, filter: &RiskFilter) -> CoreResult<usize> {
        Ok(self.with_tenant(
            tenant,
            |ts| ts.risks.iter().filter(|r| filter.matches(r)).count(),
            0,
        ))
    }

    fn next_risk_sequence(&self, tenant: &TenantId) -> CoreResult<u32> {
        Ok(self.with_tenant(
            tenant,
            |ts| {
                ts.risks
                    .iter()
                    .filter_map(|r| r.id.sequence())
                    .max()
                    .unwrap_or(0)
                    .max(999)
                    + 1
            },
            1000,
        ))
    }

    fn list_overdue_risks(
        &self,
        tenant: &TenantId,
        now: DateTime<Utc>,
    ) -> CoreResult<Vec<SourceRecord>> {
        let today = now.date_naive();
        Ok(self.with_tenant(
            tenant,
            |ts| {
                ts.sources
                    .values()
                    .filter(|r| r.kind == SourceKind::Risk)
                    .filter(|r| r.due_date.is_some_and(|due| due < today))
                    .filter(|r| r.mitigation_status.is_some_and(|m| m.is_outstanding()))
                    .filter(|r| r.status_is("Approved"))
                    .cloned()
                    .collect()
            },
            Vec::new(),
        ))
    }

    fn list_high_priority_unassigned_risks(
        &self,
        tenant: &TenantId,
        now: DateTime<Utc>,
        within_days: i64,
    ) -> CoreResult<Vec<SourceRecord>> {
        let cutoff = now - Duration::days(within_days);
        Ok(self.with_tenant(
            tenant,
            |ts| {
                ts.sources
                    .values()
                    .filter(|r| r.kind == SourceKind::Risk)
                    .filter(|r| r.criticality.is_elevated())
                    .filter(|r| r.status_is("Not Assigned"))
                    .filter(|r| r.created_at >= cutoff)
                    .cloned()
                    .collect()
            },
            Vec::new(),
        ))
    }

    fn list_stale_compliance(
        &self,
        tenant: &TenantId,
        now: DateTime<Utc>,
        age_days: i64,
    ) -> CoreResult<Vec<SourceRecord>> {
        let cutoff = now - Duration::days(age_days);
        Ok(self.with_tenant(
            tenant,
            |ts| {
                ts.sources
                    .values()
                    .filter(|r| r.kind == SourceKind::Compliance)
                    .filter(|r| r.status_is("Under Review"))
                    .filter(|r| r.created_at < cutoff)
                    .cloned()
                    .collect()
            },
            Vec::new(),
        ))
    }

    fn find_user(&self, tenant: &TenantId, id: &UserId) -> CoreResult<Option<User>> {
        Ok(self.with_tenant(tenant, |ts| ts.users.get(id).cloned(), None))
    }

    fn active_role_binding(
        &self,
        tenant: &TenantId,
        user: &UserId,
    ) -> CoreResult<Option<RoleBinding>> {
        Ok(self.with_tenant(
            tenant,
            |ts| {
                ts.bindings
                    .iter()
                    .find(|b| &b.user == user && b.active)
                    .cloned()
            },
            None,
        ))
    }

    fn find_row(
        &self,
        tenant: &TenantId,
        table: &str,
        row_id: &str,
    ) -> CoreResult<Option<serde_json::Value>> {
        Ok(self.with_tenant(
            tenant,
            |ts| {
                ts.rows
                    .get(&(table.to_string(), row_id.to_string()))
                    .cloned()
            },
            None,
        ))
    }

    fn find_row_owner(&self, table: &str, row_id: &str) -> CoreResult<Option<TenantId>> {
        let key = (table.to_string(), row_id.to_string());
        let store = self.store.read();
        Ok(store
            .tenants
            .iter()
            .find(|(_, ts)| ts.rows.contains_key(&key))
            .map(|(tenant, _)| tenant.clone()))
    }

    fn find_approval(&self, approval_id: &str) -> CoreResult<Option<ApprovalRequest>> {
        let store = self.store.read();
        Ok(store.approvals.get(approval_id).cloned())
    }

    fn tenants(&self) -> CoreResult<Vec<TenantId>> {
        let store = self.store.read();
        Ok(store.tenants.keys().cloned().collect())
    }
}

enum Staged {
    Insert(SourceRecord),
    Update {
        old: SourceRecord,
        new: SourceRecord,
    },
}

impl Staged {
    fn record(&self) -> &SourceRecord {
        match self {
            Staged::Insert(record) => record,
            Staged::Update { new, .. } => new,
        }
    }
}

/// A staging transaction over source records.
///
/// Writes are invisible to readers until [`commit`](SourceTxn::commit);
/// dropping the transaction without committing aborts it, discarding
/// both the staged writes and every queued hook.
pub struct SourceTxn<'a> {
    repo: &'a InMemoryRepo,
    tenant: TenantId,
    staged: Vec<Staged>,
    queue: CommitQueue,
}

impl SourceTxn<'_> {
    /// Stage an insert and notify observers.
    pub fn insert_source(&mut self, record: SourceRecord) -> CoreResult<()> {
        if record.tenant != self.tenant {
            return Err(CoreError::cross_tenant(format!(
                "record for tenant {} staged under {}",
                record.tenant, self.tenant
            )));
        }
        for observer in self.repo.observers.read().iter() {
            observer.source_created(&record, &mut self.queue);
        }
        self.staged.push(Staged::Insert(record));
        Ok(())
    }

    /// Stage an update and notify observers with the prior state.
    ///
    /// Reads its own staged writes, so repeated updates within one
    /// transaction see each other.
    pub fn update_source(&mut self, new: SourceRecord) -> CoreResult<()> {
        if new.tenant != self.tenant {
            return Err(CoreError::cross_tenant(format!(
                "record for tenant {} staged under {}",
                new.tenant, self.tenant
            )));
        }
        let key = (new.kind, new.id.clone());
        let old = self
            .staged
            .iter()
            .rev()
            .map(Staged::record)
            .find(|r| (r.kind, r.id.clone()) == key)
            .cloned()
            .or_else(|| {
                self.repo
                    .with_tenant(&self.tenant, |ts| ts.sources.get(&key).cloned(), None)
            })
            .ok_or_else(|| {
                CoreError::not_found(format!(
                    "{} record {} not found in tenant {}",
                    new.kind, new.id, self.tenant
                ))
            })?;

        for observer in self.repo.observers.read().iter() {
            observer.source_updated(&old, &new, &mut self.queue);
        }
        self.staged.push(Staged::Update { old, new });
        Ok(())
    }

    /// Register an additional hook on this transaction's queue.
    pub fn on_commit(&mut self, hook: impl FnOnce() + Send + 'static) {
        self.queue.defer(hook);
    }

    /// Apply staged writes, then run the hook queue.
    ///
    /// The store lock is released before hooks run, so hooks may
    /// re-enter the repository.
    pub fn commit(self) {
        self.repo.apply(&self.tenant, self.staged);
        self.queue.run();
    }

    /// Discard staged writes and queued hooks.
    pub fn abort(self) {
        log::debug!(
            "aborting source transaction for tenant {} ({} staged writes, {} hooks)",
            self.tenant,
            self.staged.len(),
            self.queue.len()
        );
    }
}
