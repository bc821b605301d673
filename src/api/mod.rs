//! The protocol-agnostic external surface.
//!
//! Handlers consume a validated [`RequestContext`] and return typed
//! responses or a [`CoreError`]; HTTP routing, auth-token decoding, and
//! status-code mapping live in the adapter that wraps this.

pub mod dto;

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;

use crate::ai::Completer;
use crate::authz::RoleGate;
use crate::config::RiskmapConfig;
use crate::core::{
    Criticality, RecordId, SourceKind, SourceRecord, TenantId, TenantScope, UserId,
};
use crate::errors::{CoreError, CoreResult};
use crate::events::{EventTriggerEngine, NotificationSink, Trigger};
use crate::repo::{InMemoryRepo, Page, Repo, RiskFilter};
use crate::runner::AsyncRiskRunner;
use crate::scanner::PeriodicScanner;
use crate::synth::{RiskSynthesizer, Selection};

pub use dto::{
    CreatedEventSummary, EventItem, EventListResponse, GenerateRequest, GenerateResponse,
    JobStatusResponse, RiskPageResponse, RiskQuery, ScanResponse, WebhookRequest, WebhookResponse,
};

/// The validated request context handed in by the transport adapter.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub tenant: Option<TenantId>,
    pub user: Option<UserId>,
}

impl RequestContext {
    pub fn for_tenant(tenant: TenantId) -> Self {
        Self {
            tenant: Some(tenant),
            user: None,
        }
    }

    pub fn with_user(mut self, user: UserId) -> Self {
        self.user = Some(user);
        self
    }

    /// The tenant scope, or `MissingTenant`.
    pub fn scope(&self) -> CoreResult<TenantScope> {
        TenantScope::from_context(self.tenant.as_ref())
    }
}

/// The assembled core: repository, trigger engine, scanner, runner,
/// and role gate behind one facade.
pub struct CoreApi {
    repo: Arc<InMemoryRepo>,
    engine: EventTriggerEngine,
    scanner: PeriodicScanner,
    runner: AsyncRiskRunner,
    gate: RoleGate,
}

impl CoreApi {
    /// Wire the core together and register the trigger engine as a
    /// source-record observer.
    pub fn new(
        repo: Arc<InMemoryRepo>,
        completer: Arc<dyn Completer>,
        sink: Arc<dyn NotificationSink>,
        config: RiskmapConfig,
    ) -> Self {
        let repo_dyn: Arc<dyn Repo> = repo.clone();
        let engine = EventTriggerEngine::new(repo_dyn.clone(), sink);
        repo.register_observer(Arc::new(engine.clone()));

        let synthesizer = Arc::new(RiskSynthesizer::new(
            repo_dyn.clone(),
            completer,
            config.completer.clone(),
        ));
        let runner = AsyncRiskRunner::new(repo_dyn.clone(), synthesizer, config.runner.clone());
        let scanner = PeriodicScanner::new(repo_dyn.clone(), engine.clone(), config.scanner.clone());
        let gate = RoleGate::new(repo_dyn);

        Self {
            repo,
            engine,
            scanner,
            runner,
            gate,
        }
    }

    pub fn repo(&self) -> &Arc<InMemoryRepo> {
        &self.repo
    }

    pub fn engine(&self) -> &EventTriggerEngine {
        &self.engine
    }

    /// POST /webhook/risk-source
    pub fn webhook(
        &self,
        ctx: &RequestContext,
        request: &WebhookRequest,
        now: DateTime<Utc>,
    ) -> CoreResult<WebhookResponse> {
        let scope = ctx.scope()?;

        let trigger_name = request
            .trigger_type
            .as_deref()
            .ok_or_else(|| CoreError::invalid_input("missing trigger_type"))?;
        let kind_name = request
            .record_type
            .as_deref()
            .ok_or_else(|| CoreError::invalid_input("missing record_type"))?;
        let kind = SourceKind::parse(kind_name)
            .ok_or_else(|| CoreError::invalid_input(format!("invalid record_type {}", kind_name)))?;
        let trigger = Trigger::parse(trigger_name).ok_or_else(|| {
            CoreError::invalid_input(format!("unknown trigger_type {}", trigger_name))
        })?;
        if trigger.kind() != kind {
            return Err(CoreError::invalid_input(format!(
                "trigger {} does not apply to record_type {}",
                trigger, kind
            )));
        }

        let record = match (&request.record_id, &request.details) {
            (Some(record_id), _) => {
                let id = RecordId::new(record_id.clone());
                self.repo
                    .find_source(scope.tenant(), kind, &id)?
                    .ok_or_else(|| {
                        CoreError::not_found(format!(
                            "{} record {} not found in tenant {}",
                            kind,
                            id,
                            scope.tenant()
                        ))
                    })?
            }
            (None, Some(details)) => {
                let record = synthesize_record(scope.tenant(), kind, details, now);
                self.repo.seed_source(record.clone());
                record
            }
            (None, None) => {
                return Err(CoreError::invalid_input(
                    "record_id or record details required",
                ));
            }
        };

        let created = self.engine.trigger_now(&record, trigger, now.date_naive())?;
        let (created_events, message) = match created {
            Some(event) => (
                vec![CreatedEventSummary::from(&event)],
                format!("event {} created", event.display_id),
            ),
            None => (
                Vec::new(),
                "an open event of this family already exists".to_string(),
            ),
        };
        Ok(WebhookResponse {
            success: true,
            created_events,
            message,
        })
    }

    /// POST /scan/triggers
    pub fn scan_triggers(
        &self,
        ctx: &RequestContext,
        now: DateTime<Utc>,
    ) -> CoreResult<ScanResponse> {
        let scope = ctx.scope()?;
        let outcome = self.scanner.scan_tenant(&scope, now);
        Ok(ScanResponse {
            overdue_mitigations: outcome.overdue_mitigations,
            escalated_risks: outcome.escalated_risks,
            stale_compliance: outcome.stale_compliance,
            created_events: outcome
                .created_events
                .iter()
                .map(CreatedEventSummary::from)
                .collect(),
        })
    }

    /// GET /events
    ///
    /// Role-gated: without a user in the context the listing is empty,
    /// never an error (fail closed).
    pub fn list_events(&self, ctx: &RequestContext) -> CoreResult<EventListResponse> {
        let scope = ctx.scope()?;
        let events = self
            .repo
            .list_events_by_kinds(scope.tenant(), &SourceKind::ALL)?;

        let visible = match &ctx.user {
            Some(user) => self.gate.filter_events(&scope, user, events),
            None => Vec::new(),
        };

        Ok(EventListResponse {
            total_count: visible.len(),
            events: visible.iter().map(EventItem::from).collect(),
        })
    }

    /// GET /risks
    pub fn list_risks(&self, ctx: &RequestContext, query: &RiskQuery) -> CoreResult<RiskPageResponse> {
        let scope = ctx.scope()?;
        let filter = RiskFilter {
            entity: query.entity.clone(),
            data: query.data.clone(),
            row: query.row.clone(),
        };
        let page = Page::new(
            query.page.unwrap_or(1),
            query.page_size.unwrap_or(Page::DEFAULT_SIZE),
        );

        let count = self.repo.count_risks(scope.tenant(), &filter)?;
        let results = self.repo.list_risks(scope.tenant(), &filter, page)?;
        let total_pages = count.div_ceil(page.page_size);

        Ok(RiskPageResponse {
            results,
            count,
            page: page.page,
            page_size: page.page_size,
            total_pages,
            has_next: page.page < total_pages,
            has_previous: page.page > 1,
        })
    }

    /// POST /risks/generate
    pub fn generate_risks(
        &self,
        ctx: &RequestContext,
        request: &GenerateRequest,
    ) -> CoreResult<GenerateResponse> {
        let scope = ctx.scope()?;

        if let Some(approval_id) = &request.approval_id {
            let outcome = self.runner.submit_for_approval(&scope, approval_id)?;
            return Ok(GenerateResponse {
                status: outcome.as_str().to_string(),
                key: approval_id.clone(),
            });
        }

        let entity = request
            .entity
            .as_deref()
            .ok_or_else(|| CoreError::invalid_input("missing entity"))?;
        let table = request
            .table
            .as_deref()
            .ok_or_else(|| CoreError::invalid_input("missing table"))?;
        let row_id = request
            .row_id
            .as_deref()
            .ok_or_else(|| CoreError::invalid_input("missing row_id"))?;

        // Distinguish a foreign row from a missing one before any job
        // starts.
        match self.repo.find_row_owner(table, row_id)? {
            None => {
                return Err(CoreError::not_found(format!(
                    "row {} not found in table {}",
                    row_id, table
                )));
            }
            Some(owner) => scope.ensure(&owner)?,
        }

        let selection = Selection {
            tenant: scope.tenant().clone(),
            entity: entity.to_string(),
            table: table.to_string(),
            row: row_id.to_string(),
        };
        let (key, outcome) = self.runner.submit_selection(&scope, selection)?;
        Ok(GenerateResponse {
            status: outcome.as_str().to_string(),
            key,
        })
    }

    /// GET /risks/status/{key}
    pub fn job_status(&self, ctx: &RequestContext, key: &str) -> CoreResult<JobStatusResponse> {
        let scope = ctx.scope()?;

        // A key owned by another tenant reads as absent rather than
        // confirming its existence.
        if let Some(owner) = self.job_tenant(key)? {
            if scope.ensure(&owner).is_err() {
                return Err(CoreError::not_found(format!("no job under key {}", key)));
            }
        }

        match self.runner.status(key) {
            Some(status) => Ok(JobStatusResponse {
                status: status.state,
                processing_time: status.processing_secs,
                completed_at: status.completed_at,
                result: status.result,
                error: status.error,
            }),
            None => Err(CoreError::not_found(format!("no job under key {}", key))),
        }
    }

    /// The tenant a job key belongs to, when it can be resolved.
    fn job_tenant(&self, key: &str) -> CoreResult<Option<TenantId>> {
        if let Some(approval) = self.repo.find_approval(key)? {
            return Ok(Some(approval.tenant));
        }
        Ok(key.split_once(':').map(|(tenant, _)| TenantId::from(tenant)))
    }
}

/// Build a source record from inline webhook details.
fn synthesize_record(
    tenant: &TenantId,
    kind: SourceKind,
    details: &serde_json::Value,
    now: DateTime<Utc>,
) -> SourceRecord {
    let text = |key: &str| details.get(key).and_then(|v| v.as_str());
    let id = text("id")
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}-{}", kind, now.timestamp_millis()));
    let criticality = text("criticality")
        .or_else(|| text("severity"))
        .and_then(Criticality::parse)
        .unwrap_or(Criticality::Medium);
    let due_date = text("due_date")
        .or_else(|| text("mitigation_due_date"))
        .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok());

    SourceRecord {
        id: RecordId::new(id),
        tenant: tenant.clone(),
        kind,
        title: text("title")
            .map(str::to_string)
            .unwrap_or_else(|| format!("Unnamed {} record", kind)),
        description: text("description").unwrap_or_default().to_string(),
        criticality,
        status: text("status").unwrap_or("Open").to_string(),
        due_date,
        mitigation_status: None,
        framework: text("framework").map(str::to_string),
        owner: text("owner").map(UserId::from),
        reviewer: text("reviewer").map(UserId::from),
        created_at: now,
        updated_at: now,
    }
}
