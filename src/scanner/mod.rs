//! Periodic scans for overdue and escalatable source records.
//!
//! Invoked manually or by a scheduled job. Nothing in here raises out
//! of the top-level call: list failures and per-record trigger failures
//! are logged and counted as skips.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::config::ScannerConfig;
use crate::core::{Event, SourceRecord, TenantScope};
use crate::events::{EventTriggerEngine, Trigger};
use crate::repo::Repo;

/// What one scan pass produced.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub overdue_mitigations: usize,
    pub escalated_risks: usize,
    pub stale_compliance: usize,
    pub created_events: Vec<Event>,
}

impl ScanOutcome {
    pub fn total_created(&self) -> usize {
        self.created_events.len()
    }

    fn absorb(&mut self, other: ScanOutcome) {
        self.overdue_mitigations += other.overdue_mitigations;
        self.escalated_risks += other.escalated_risks;
        self.stale_compliance += other.stale_compliance;
        self.created_events.extend(other.created_events);
    }
}

/// Scans tenants for records that should have produced events by now.
pub struct PeriodicScanner {
    repo: Arc<dyn Repo>,
    engine: EventTriggerEngine,
    config: ScannerConfig,
}

impl PeriodicScanner {
    pub fn new(repo: Arc<dyn Repo>, engine: EventTriggerEngine, config: ScannerConfig) -> Self {
        Self {
            repo,
            engine,
            config,
        }
    }

    /// Scan one tenant. Each family dedups against its canonical title
    /// hint, so re-running the scan on an unchanged repository creates
    /// nothing.
    pub fn scan_tenant(&self, scope: &TenantScope, now: DateTime<Utc>) -> ScanOutcome {
        let tenant = scope.tenant();
        let mut outcome = ScanOutcome::default();

        let overdue = self.list_or_empty(
            self.repo.list_overdue_risks(tenant, now),
            "overdue risks",
        );
        outcome.overdue_mitigations =
            self.fire_all(&overdue, Trigger::MitigationOverdue, now, &mut outcome.created_events);

        let unassigned = self.list_or_empty(
            self.repo.list_high_priority_unassigned_risks(
                tenant,
                now,
                self.config.escalation_window_days,
            ),
            "unassigned high-priority risks",
        );
        outcome.escalated_risks =
            self.fire_all(&unassigned, Trigger::RiskEscalated, now, &mut outcome.created_events);

        let stale = self.list_or_empty(
            self.repo
                .list_stale_compliance(tenant, now, self.config.stale_compliance_days),
            "stale compliance items",
        );
        outcome.stale_compliance = self.fire_all(
            &stale,
            Trigger::ComplianceReviewRequired,
            now,
            &mut outcome.created_events,
        );

        log::info!(
            "scan for tenant {}: {} overdue, {} escalated, {} stale, {} events created",
            tenant,
            outcome.overdue_mitigations,
            outcome.escalated_risks,
            outcome.stale_compliance,
            outcome.total_created()
        );
        outcome
    }

    /// Scan every tenant the repository knows about.
    pub fn scan_all(&self, now: DateTime<Utc>) -> ScanOutcome {
        let tenants = self.list_or_empty(self.repo.tenants(), "tenants");
        let mut outcome = ScanOutcome::default();
        for tenant in tenants {
            outcome.absorb(self.scan_tenant(&TenantScope::new(tenant), now));
        }
        outcome
    }

    fn fire_all(
        &self,
        records: &[SourceRecord],
        trigger: Trigger,
        now: DateTime<Utc>,
        created: &mut Vec<Event>,
    ) -> usize {
        let mut count = 0;
        for record in records {
            match self.engine.trigger_now(record, trigger, now.date_naive()) {
                Ok(Some(event)) => {
                    created.push(event);
                    count += 1;
                }
                Ok(None) => {}
                Err(err) => {
                    log::warn!(
                        "scan trigger {} for {} {} in tenant {} failed: {}",
                        trigger,
                        record.kind,
                        record.id,
                        record.tenant,
                        err
                    );
                }
            }
        }
        count
    }

    fn list_or_empty<T>(
        &self,
        result: crate::errors::CoreResult<Vec<T>>,
        what: &str,
    ) -> Vec<T> {
        match result {
            Ok(items) => items,
            Err(err) => {
                log::warn!("listing {} failed: {}", what, err);
                Vec::new()
            }
        }
    }
}
