//! Event construction: per-kind, per-trigger matrices for priority,
//! status, and window.

use chrono::{Duration, NaiveDate};

use crate::core::{EventDraft, EventStatus, Priority, RecurrenceType, SourceKind, SourceRecord};

use super::trigger::Trigger;

/// Builds fully populated event drafts from source records.
pub struct EventFactory;

impl EventFactory {
    /// Build the event for `trigger` against `record`.
    ///
    /// `today` becomes the start date; the end date is a domain
    /// deadline where one applies (and may precede the start date for
    /// overdue triggers), otherwise a fixed per-kind offset.
    pub fn build(record: &SourceRecord, trigger: Trigger, today: NaiveDate) -> EventDraft {
        EventDraft {
            tenant: record.tenant.clone(),
            title: format!("{}: {}", trigger.title_verb(), record.title),
            description: format!("{}: {}", trigger.description_lead(), record.description),
            linked_record_type: record.kind,
            linked_record_id: record.id.clone(),
            linked_record_name: record.title.clone(),
            category: record.kind.module().to_string(),
            priority: Self::priority(trigger, record),
            status: Self::status(trigger),
            start_date: today,
            end_date: Self::end_date(trigger, record, today),
            recurrence: RecurrenceType::NonRecurring,
            framework: record.framework.clone(),
            owner: record.owner.clone(),
            reviewer: record.reviewer.clone(),
            creator: record.owner.clone(),
        }
    }

    /// Priority matrix: audit events are always High, policy events
    /// follow a per-trigger table, everything else carries the source
    /// criticality (severity for incidents) verbatim.
    fn priority(trigger: Trigger, record: &SourceRecord) -> Priority {
        match trigger {
            Trigger::MitigationCompleted => Priority::Low,
            Trigger::PolicyReviewDue | Trigger::PolicyUpdateRequired | Trigger::PolicyRejected => {
                Priority::Medium
            }
            Trigger::PolicyApprovalNeeded | Trigger::PolicyExpirationWarning => Priority::High,
            Trigger::PolicyApproved | Trigger::PolicyPublished | Trigger::PolicyArchived => {
                Priority::Low
            }
            _ => match trigger.kind() {
                SourceKind::Audit => Priority::High,
                _ => record.criticality.into(),
            },
        }
    }

    /// Status matrix.
    fn status(trigger: Trigger) -> EventStatus {
        match trigger {
            Trigger::RiskApproved
            | Trigger::ComplianceApproved
            | Trigger::AuditApproved
            | Trigger::PolicyApproved => EventStatus::Approved,
            Trigger::RiskRejected
            | Trigger::ComplianceRejected
            | Trigger::AuditRejected
            | Trigger::PolicyRejected => EventStatus::Rejected,
            Trigger::RiskEscalated
            | Trigger::IncidentEscalated
            | Trigger::PolicyApprovalNeeded => EventStatus::UnderReview,
            Trigger::MitigationCompleted
            | Trigger::IncidentResolved
            | Trigger::PolicyPublished
            | Trigger::PolicyArchived => EventStatus::Completed,
            _ => EventStatus::PendingReview,
        }
    }

    /// Window matrix. Risk events end at the mitigation due date when
    /// one exists; the completion event closes the same day it opens.
    fn end_date(trigger: Trigger, record: &SourceRecord, start: NaiveDate) -> NaiveDate {
        match trigger {
            Trigger::MitigationCompleted => start,
            Trigger::PolicyExpirationWarning => start + Duration::days(7),
            Trigger::PolicyReviewDue | Trigger::PolicyUpdateRequired => start + Duration::days(30),
            Trigger::PolicyApprovalNeeded
            | Trigger::PolicyApproved
            | Trigger::PolicyRejected
            | Trigger::PolicyPublished
            | Trigger::PolicyArchived => start + Duration::days(14),
            _ => match trigger.kind() {
                SourceKind::Risk => record.due_date.unwrap_or(start + Duration::days(30)),
                SourceKind::Compliance => start + Duration::days(30),
                SourceKind::Audit => start + Duration::days(14),
                SourceKind::Incident => start + Duration::days(7),
                SourceKind::Policy => start + Duration::days(14),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Criticality, RecordId, TenantId, UserId};
    use chrono::Utc;

    fn record(kind: SourceKind, criticality: Criticality) -> SourceRecord {
        SourceRecord {
            id: RecordId::from("rec-1"),
            tenant: TenantId::from("t1"),
            kind,
            title: "Quarterly access review".to_string(),
            description: "Controls around privileged access".to_string(),
            criticality,
            status: "Open".to_string(),
            due_date: None,
            mitigation_status: None,
            framework: Some("ISO 27001".to_string()),
            owner: Some(UserId::from("u-owner")),
            reviewer: Some(UserId::from("u-reviewer")),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 10).unwrap()
    }

    #[test]
    fn test_title_and_description_templates() {
        let rec = record(SourceKind::Risk, Criticality::High);
        let draft = EventFactory::build(&rec, Trigger::RiskDetected, today());
        assert_eq!(draft.title, "Risk Detected: Quarterly access review");
        assert!(draft
            .description
            .starts_with("A new risk has been identified"));
        assert!(draft.description.ends_with(&rec.description));
        assert_eq!(draft.category, "Risk Management");
        assert_eq!(draft.linked_record_name, rec.title);
    }

    #[test]
    fn test_risk_priority_is_verbatim_criticality() {
        for (criticality, expected) in [
            (Criticality::Critical, Priority::Critical),
            (Criticality::High, Priority::High),
            (Criticality::Medium, Priority::Medium),
            (Criticality::Low, Priority::Low),
        ] {
            let rec = record(SourceKind::Risk, criticality);
            let draft = EventFactory::build(&rec, Trigger::RiskDetected, today());
            assert_eq!(draft.priority, expected);
        }
    }

    #[test]
    fn test_risk_status_matrix() {
        let rec = record(SourceKind::Risk, Criticality::Medium);
        let cases = [
            (Trigger::RiskDetected, EventStatus::PendingReview),
            (Trigger::RiskEscalated, EventStatus::UnderReview),
            (Trigger::MitigationOverdue, EventStatus::PendingReview),
            (Trigger::RiskApproved, EventStatus::Approved),
            (Trigger::RiskRejected, EventStatus::Rejected),
        ];
        for (trigger, expected) in cases {
            assert_eq!(EventFactory::build(&rec, trigger, today()).status, expected);
        }
    }

    #[test]
    fn test_risk_window_uses_due_date_when_present() {
        let mut rec = record(SourceKind::Risk, Criticality::Medium);
        let draft = EventFactory::build(&rec, Trigger::RiskDetected, today());
        assert_eq!(draft.end_date, today() + Duration::days(30));

        let due = today() - Duration::days(1);
        rec.due_date = Some(due);
        let draft = EventFactory::build(&rec, Trigger::MitigationOverdue, today());
        assert_eq!(draft.start_date, today());
        assert_eq!(draft.end_date, due);
    }

    #[test]
    fn test_mitigation_completed_is_one_day_low_completed() {
        let rec = record(SourceKind::Risk, Criticality::Critical);
        let draft = EventFactory::build(&rec, Trigger::MitigationCompleted, today());
        assert_eq!(draft.status, EventStatus::Completed);
        assert_eq!(draft.priority, Priority::Low);
        assert_eq!(draft.end_date, draft.start_date);
    }

    #[test]
    fn test_audit_events_are_high_with_14_day_window() {
        let rec = record(SourceKind::Audit, Criticality::Low);
        for trigger in [
            Trigger::AuditFinding,
            Trigger::AuditOverdue,
            Trigger::AuditScheduled,
        ] {
            let draft = EventFactory::build(&rec, trigger, today());
            assert_eq!(draft.priority, Priority::High);
            assert_eq!(draft.end_date, today() + Duration::days(14));
        }
    }

    #[test]
    fn test_incident_window_is_seven_days_with_verbatim_severity() {
        let rec = record(SourceKind::Incident, Criticality::Critical);
        let draft = EventFactory::build(&rec, Trigger::IncidentDetected, today());
        assert_eq!(draft.priority, Priority::Critical);
        assert_eq!(draft.end_date, today() + Duration::days(7));
        assert_eq!(
            EventFactory::build(&rec, Trigger::IncidentResolved, today()).status,
            EventStatus::Completed
        );
    }

    #[test]
    fn test_compliance_window_is_thirty_days() {
        let rec = record(SourceKind::Compliance, Criticality::Medium);
        let draft = EventFactory::build(&rec, Trigger::ComplianceReviewRequired, today());
        assert_eq!(draft.end_date, today() + Duration::days(30));
        assert_eq!(draft.status, EventStatus::PendingReview);
        assert_eq!(draft.framework.as_deref(), Some("ISO 27001"));
    }

    #[test]
    fn test_policy_trigger_table() {
        let rec = record(SourceKind::Policy, Criticality::Medium);
        let cases = [
            (
                Trigger::PolicyReviewDue,
                Priority::Medium,
                EventStatus::PendingReview,
                30,
            ),
            (
                Trigger::PolicyUpdateRequired,
                Priority::Medium,
                EventStatus::PendingReview,
                30,
            ),
            (
                Trigger::PolicyApprovalNeeded,
                Priority::High,
                EventStatus::UnderReview,
                14,
            ),
            (
                Trigger::PolicyExpirationWarning,
                Priority::High,
                EventStatus::PendingReview,
                7,
            ),
            (
                Trigger::PolicyApproved,
                Priority::Low,
                EventStatus::Approved,
                14,
            ),
            (
                Trigger::PolicyRejected,
                Priority::Medium,
                EventStatus::Rejected,
                14,
            ),
            (
                Trigger::PolicyPublished,
                Priority::Low,
                EventStatus::Completed,
                14,
            ),
            (
                Trigger::PolicyArchived,
                Priority::Low,
                EventStatus::Completed,
                14,
            ),
        ];
        for (trigger, priority, status, days) in cases {
            let draft = EventFactory::build(&rec, trigger, today());
            assert_eq!(draft.priority, priority, "{} priority", trigger);
            assert_eq!(draft.status, status, "{} status", trigger);
            assert_eq!(
                draft.end_date,
                today() + Duration::days(days),
                "{} window",
                trigger
            );
        }
    }

    #[test]
    fn test_owner_becomes_creator() {
        let rec = record(SourceKind::Risk, Criticality::Medium);
        let draft = EventFactory::build(&rec, Trigger::RiskDetected, today());
        assert_eq!(draft.owner, rec.owner);
        assert_eq!(draft.creator, rec.owner);
        assert_eq!(draft.reviewer, rec.reviewer);
    }
}
