//! The trigger engine: routes source-record lifecycle transitions to
//! event creation.
//!
//! Creation always runs after the triggering transaction commits, and
//! every failure inside the hook is logged and swallowed so that event
//! side-effects can never abort or poison a source-record write.

use chrono::{NaiveDate, Utc};
use std::sync::Arc;

use crate::core::{Event, SourceRecord, TenantId, UserId};
use crate::errors::CoreResult;
use crate::repo::{CommitQueue, Repo, SourceObserver};

use super::factory::EventFactory;
use super::notify::{EventNotification, NotificationSink, Recipient};
use super::trigger::Trigger;

/// Observes source-record lifecycles and materializes events.
#[derive(Clone)]
pub struct EventTriggerEngine {
    repo: Arc<dyn Repo>,
    sink: Arc<dyn NotificationSink>,
}

impl EventTriggerEngine {
    pub fn new(repo: Arc<dyn Repo>, sink: Arc<dyn NotificationSink>) -> Self {
        Self { repo, sink }
    }

    /// Create the event for `trigger` now, unless an open event of the
    /// same family already exists for the record.
    ///
    /// Returns the created event, or `None` when dedup suppressed it.
    pub fn trigger_now(
        &self,
        record: &SourceRecord,
        trigger: Trigger,
        today: NaiveDate,
    ) -> CoreResult<Option<Event>> {
        let tenant = &record.tenant;
        if let Some(existing) = self.repo.find_open_event(
            tenant,
            record.kind,
            &record.id,
            trigger.dedup_hint(),
        )? {
            log::debug!(
                "skipping {} for {} {} in tenant {}: open event {} already covers it",
                trigger,
                record.kind,
                record.id,
                tenant,
                existing.display_id
            );
            return Ok(None);
        }

        let mut draft = EventFactory::build(record, trigger, today);
        draft.owner = self.resolve_user(tenant, draft.owner);
        draft.reviewer = self.resolve_user(tenant, draft.reviewer);
        draft.creator = self.resolve_user(tenant, draft.creator);

        let event = self.repo.insert_event(tenant, draft)?;
        log::info!(
            "created event {} ({}) for {} {} in tenant {}",
            event.display_id,
            trigger,
            record.kind,
            record.id,
            tenant
        );
        self.notify_created(&event);
        Ok(Some(event))
    }

    /// Keep a user reference only when it resolves inside the tenant.
    fn resolve_user(&self, tenant: &TenantId, user: Option<UserId>) -> Option<UserId> {
        let user = user?;
        match self.repo.find_user(tenant, &user) {
            Ok(Some(_)) => Some(user),
            Ok(None) => {
                log::debug!("user {} not found in tenant {}, dropping reference", user, tenant);
                None
            }
            Err(err) => {
                log::warn!("user lookup failed in tenant {}: {}", tenant, err);
                None
            }
        }
    }

    /// Best-effort notification fan-out. Per-recipient failures are
    /// logged and swallowed.
    fn notify_created(&self, event: &Event) {
        let creator_name = event
            .creator
            .as_ref()
            .and_then(|id| self.repo.find_user(&event.tenant, id).ok().flatten())
            .map(|u| u.display_name)
            .unwrap_or_default();

        for recipient in self.recipients(event) {
            let notification = EventNotification::for_recipient(&recipient, event, &creator_name);
            if let Err(err) = self.sink.event_created(&recipient, event, &notification) {
                log::warn!(
                    "notification to {} for event {} in tenant {} failed: {}",
                    recipient.email,
                    event.display_id,
                    event.tenant,
                    err
                );
            }
        }
    }

    /// Distinct recipients among owner, reviewer, and creator, keeping
    /// only users that resolve in the tenant and carry an email.
    fn recipients(&self, event: &Event) -> Vec<Recipient> {
        let candidates = [
            ("Owner", event.owner.as_ref()),
            ("Reviewer", event.reviewer.as_ref()),
            ("Creator", event.creator.as_ref()),
        ];

        let mut seen = Vec::new();
        let mut recipients = Vec::new();
        for (role, user_id) in candidates {
            let Some(user_id) = user_id else { continue };
            let user = match self.repo.find_user(&event.tenant, user_id) {
                Ok(Some(user)) => user,
                _ => continue,
            };
            let Some(email) = user.email else { continue };
            if seen.contains(&email) {
                continue;
            }
            seen.push(email.clone());
            recipients.push(Recipient {
                role: role.to_string(),
                email,
                display_name: user.display_name,
            });
        }
        recipients
    }

    /// Fire from a commit hook: failures are logged and swallowed.
    fn fire_logged(&self, record: &SourceRecord, trigger: Trigger) {
        let today = Utc::now().date_naive();
        if let Err(err) = self.trigger_now(record, trigger, today) {
            log::warn!(
                "event creation for {} on {} {} in tenant {} failed: {}",
                trigger,
                record.kind,
                record.id,
                record.tenant,
                err
            );
        }
    }

    /// Map an old/new record pair to the triggers it fires.
    pub fn update_transitions(old: &SourceRecord, new: &SourceRecord) -> Vec<Trigger> {
        let mut triggers = Vec::new();
        let kind = new.kind;

        if !new.status.eq_ignore_ascii_case(&old.status) {
            if new.status_is("Approved") {
                triggers.extend(Trigger::approved_for(kind));
            } else if new.status_is("Rejected") {
                triggers.extend(Trigger::rejected_for(kind));
            } else {
                match kind {
                    crate::core::SourceKind::Incident if new.status_is("Resolved") => {
                        triggers.push(Trigger::IncidentResolved);
                    }
                    crate::core::SourceKind::Policy if new.status_is("Published") => {
                        triggers.push(Trigger::PolicyPublished);
                    }
                    crate::core::SourceKind::Policy if new.status_is("Archived") => {
                        triggers.push(Trigger::PolicyArchived);
                    }
                    crate::core::SourceKind::Compliance
                        if new.status_is("Breached") || new.status_is("Non-Compliant") =>
                    {
                        triggers.push(Trigger::ComplianceBreach);
                    }
                    _ => {}
                }
            }
        }

        if new.criticality.is_elevated() && new.criticality.raised_from(&old.criticality) {
            match kind {
                crate::core::SourceKind::Risk => triggers.push(Trigger::RiskEscalated),
                crate::core::SourceKind::Incident => triggers.push(Trigger::IncidentEscalated),
                _ => {}
            }
        }

        let completed_now = new
            .mitigation_status
            .is_some_and(|m| !m.is_outstanding())
            && old.mitigation_status.is_none_or(|m| m.is_outstanding());
        if kind == crate::core::SourceKind::Risk && completed_now {
            triggers.push(Trigger::MitigationCompleted);
        }

        triggers
    }
}

impl SourceObserver for EventTriggerEngine {
    fn source_created(&self, record: &SourceRecord, queue: &mut CommitQueue) {
        let engine = self.clone();
        let record = record.clone();
        let trigger = Trigger::created_for(record.kind);
        queue.defer(move || engine.fire_logged(&record, trigger));
    }

    fn source_updated(&self, old: &SourceRecord, new: &SourceRecord, queue: &mut CommitQueue) {
        for trigger in Self::update_transitions(old, new) {
            let engine = self.clone();
            let record = new.clone();
            queue.defer(move || engine.fire_logged(&record, trigger));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Criticality, MitigationStatus, RecordId, SourceKind};
    use crate::events::notify::{NullSink, RecordingSink};
    use crate::repo::InMemoryRepo;
    use chrono::Utc;

    fn record(kind: SourceKind, status: &str) -> SourceRecord {
        SourceRecord {
            id: RecordId::from("rec-1"),
            tenant: TenantId::from("t1"),
            kind,
            title: "Patch cadence".to_string(),
            description: "Patching is behind schedule".to_string(),
            criticality: Criticality::Medium,
            status: status.to_string(),
            due_date: None,
            mitigation_status: None,
            framework: None,
            owner: None,
            reviewer: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_transition_to_approved() {
        let old = record(SourceKind::Policy, "Under Review");
        let new = record(SourceKind::Policy, "Approved");
        assert_eq!(
            EventTriggerEngine::update_transitions(&old, &new),
            vec![Trigger::PolicyApproved]
        );
    }

    #[test]
    fn test_unchanged_status_fires_nothing() {
        let old = record(SourceKind::Policy, "Approved");
        let new = record(SourceKind::Policy, "Approved");
        assert!(EventTriggerEngine::update_transitions(&old, &new).is_empty());
    }

    #[test]
    fn test_incident_has_no_approval_trigger() {
        let old = record(SourceKind::Incident, "Open");
        let new = record(SourceKind::Incident, "Approved");
        assert!(EventTriggerEngine::update_transitions(&old, &new).is_empty());
    }

    #[test]
    fn test_severity_raise_escalates() {
        let old = record(SourceKind::Risk, "Open");
        let mut new = record(SourceKind::Risk, "Open");
        new.criticality = Criticality::High;
        assert_eq!(
            EventTriggerEngine::update_transitions(&old, &new),
            vec![Trigger::RiskEscalated]
        );

        // lowering severity does not escalate
        let mut lowered = record(SourceKind::Risk, "Open");
        lowered.criticality = Criticality::Low;
        let was_high = {
            let mut r = record(SourceKind::Risk, "Open");
            r.criticality = Criticality::High;
            r
        };
        assert!(EventTriggerEngine::update_transitions(&was_high, &lowered).is_empty());
    }

    #[test]
    fn test_mitigation_completion_fires_once() {
        let mut old = record(SourceKind::Risk, "Approved");
        old.mitigation_status = Some(MitigationStatus::WorkInProgress);
        let mut new = record(SourceKind::Risk, "Approved");
        new.mitigation_status = Some(MitigationStatus::Completed);
        assert_eq!(
            EventTriggerEngine::update_transitions(&old, &new),
            vec![Trigger::MitigationCompleted]
        );

        // already completed: no re-fire
        let mut still = record(SourceKind::Risk, "Approved");
        still.mitigation_status = Some(MitigationStatus::Completed);
        assert!(EventTriggerEngine::update_transitions(&new, &still).is_empty());
    }

    #[test]
    fn test_trigger_now_dedups_open_family() {
        let repo = Arc::new(InMemoryRepo::new());
        let engine = EventTriggerEngine::new(repo.clone(), Arc::new(NullSink));
        let rec = record(SourceKind::Risk, "Approved");
        repo.seed_source(rec.clone());
        let today = Utc::now().date_naive();

        let first = engine
            .trigger_now(&rec, Trigger::MitigationOverdue, today)
            .unwrap();
        assert!(first.is_some());

        let second = engine
            .trigger_now(&rec, Trigger::MitigationOverdue, today)
            .unwrap();
        assert!(second.is_none());

        // a different family is not suppressed
        let escalated = engine
            .trigger_now(&rec, Trigger::RiskEscalated, today)
            .unwrap();
        assert!(escalated.is_some());
    }

    #[test]
    fn test_notifications_carry_template_order() {
        use crate::core::User;
        let repo = Arc::new(InMemoryRepo::new());
        let sink = Arc::new(RecordingSink::new());
        let engine = EventTriggerEngine::new(repo.clone(), sink.clone());

        let tenant = TenantId::from("t1");
        repo.insert_user(User {
            id: UserId::from("u-owner"),
            tenant: tenant.clone(),
            username: "jordan".to_string(),
            display_name: "Jordan Lee".to_string(),
            email: Some("jordan@example.com".to_string()),
            active: true,
        });

        let mut rec = record(SourceKind::Risk, "Open");
        rec.owner = Some(UserId::from("u-owner"));
        repo.seed_source(rec.clone());

        engine
            .trigger_now(&rec, Trigger::RiskDetected, Utc::now().date_naive())
            .unwrap()
            .unwrap();

        let sent = sink.sent();
        // owner and creator are the same user: one notification
        assert_eq!(sent.len(), 1);
        let (recipient, notification) = &sent[0];
        assert_eq!(recipient.role, "Owner");
        assert_eq!(recipient.email, "jordan@example.com");
        assert_eq!(notification.template_data[0], "Jordan Lee");
        assert_eq!(notification.template_data[1], "Risk Detected: Patch cadence");
        assert_eq!(notification.template_data[3], "Jordan Lee");
        assert_eq!(notification.template_data[4], "Risk Management");
    }

    #[test]
    fn test_notification_failure_does_not_fail_event_creation() {
        use crate::core::User;
        use crate::events::notify::FailingSink;
        let repo = Arc::new(InMemoryRepo::new());
        let engine = EventTriggerEngine::new(repo.clone(), Arc::new(FailingSink));

        let tenant = TenantId::from("t1");
        repo.insert_user(User {
            id: UserId::from("u-owner"),
            tenant: tenant.clone(),
            username: "sam".to_string(),
            display_name: "Sam Rivera".to_string(),
            email: Some("sam@example.com".to_string()),
            active: true,
        });
        let mut rec = record(SourceKind::Risk, "Open");
        rec.owner = Some(UserId::from("u-owner"));
        repo.seed_source(rec.clone());

        // the sink fails for every recipient, the event still lands
        let event = engine
            .trigger_now(&rec, Trigger::RiskDetected, Utc::now().date_naive())
            .unwrap();
        assert!(event.is_some());
    }

    #[test]
    fn test_unresolvable_users_are_dropped_from_event() {
        let repo = Arc::new(InMemoryRepo::new());
        let engine = EventTriggerEngine::new(repo.clone(), Arc::new(NullSink));

        let mut rec = record(SourceKind::Risk, "Open");
        rec.owner = Some(UserId::from("ghost"));
        repo.seed_source(rec.clone());

        let event = engine
            .trigger_now(&rec, Trigger::RiskDetected, Utc::now().date_naive())
            .unwrap()
            .unwrap();
        assert!(event.owner.is_none());
        assert!(event.creator.is_none());
    }
}
