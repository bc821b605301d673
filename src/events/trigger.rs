//! Named lifecycle triggers and their canonical phrases.
//!
//! The title verb doubles as the dedup vocabulary: an open event whose
//! title contains the trigger family's hint suppresses re-creation for
//! the same source record.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::SourceKind;

/// Every trigger the engine can fire, across the five source kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    // risk instance
    RiskDetected,
    RiskEscalated,
    MitigationOverdue,
    MitigationCompleted,
    RiskApproved,
    RiskRejected,
    // compliance
    ComplianceBreach,
    ComplianceOverdue,
    ComplianceApproved,
    ComplianceRejected,
    ComplianceReviewRequired,
    // audit
    AuditFinding,
    AuditOverdue,
    AuditApproved,
    AuditRejected,
    AuditScheduled,
    // incident
    IncidentDetected,
    IncidentEscalated,
    IncidentResolved,
    IncidentOverdue,
    // policy
    PolicyReviewDue,
    PolicyUpdateRequired,
    PolicyApprovalNeeded,
    PolicyExpirationWarning,
    PolicyApproved,
    PolicyRejected,
    PolicyPublished,
    PolicyArchived,
}

impl Trigger {
    pub const ALL: [Trigger; 28] = [
        Trigger::RiskDetected,
        Trigger::RiskEscalated,
        Trigger::MitigationOverdue,
        Trigger::MitigationCompleted,
        Trigger::RiskApproved,
        Trigger::RiskRejected,
        Trigger::ComplianceBreach,
        Trigger::ComplianceOverdue,
        Trigger::ComplianceApproved,
        Trigger::ComplianceRejected,
        Trigger::ComplianceReviewRequired,
        Trigger::AuditFinding,
        Trigger::AuditOverdue,
        Trigger::AuditApproved,
        Trigger::AuditRejected,
        Trigger::AuditScheduled,
        Trigger::IncidentDetected,
        Trigger::IncidentEscalated,
        Trigger::IncidentResolved,
        Trigger::IncidentOverdue,
        Trigger::PolicyReviewDue,
        Trigger::PolicyUpdateRequired,
        Trigger::PolicyApprovalNeeded,
        Trigger::PolicyExpirationWarning,
        Trigger::PolicyApproved,
        Trigger::PolicyRejected,
        Trigger::PolicyPublished,
        Trigger::PolicyArchived,
    ];

    /// The snake_case wire name (`risk_detected`, ...).
    pub fn name(&self) -> &'static str {
        match self {
            Trigger::RiskDetected => "risk_detected",
            Trigger::RiskEscalated => "risk_escalated",
            Trigger::MitigationOverdue => "mitigation_overdue",
            Trigger::MitigationCompleted => "mitigation_completed",
            Trigger::RiskApproved => "risk_approved",
            Trigger::RiskRejected => "risk_rejected",
            Trigger::ComplianceBreach => "compliance_breach",
            Trigger::ComplianceOverdue => "compliance_overdue",
            Trigger::ComplianceApproved => "compliance_approved",
            Trigger::ComplianceRejected => "compliance_rejected",
            Trigger::ComplianceReviewRequired => "compliance_review_required",
            Trigger::AuditFinding => "audit_finding",
            Trigger::AuditOverdue => "audit_overdue",
            Trigger::AuditApproved => "audit_approved",
            Trigger::AuditRejected => "audit_rejected",
            Trigger::AuditScheduled => "audit_scheduled",
            Trigger::IncidentDetected => "incident_detected",
            Trigger::IncidentEscalated => "incident_escalated",
            Trigger::IncidentResolved => "incident_resolved",
            Trigger::IncidentOverdue => "incident_overdue",
            Trigger::PolicyReviewDue => "policy_review_due",
            Trigger::PolicyUpdateRequired => "policy_update_required",
            Trigger::PolicyApprovalNeeded => "policy_approval_needed",
            Trigger::PolicyExpirationWarning => "policy_expiration_warning",
            Trigger::PolicyApproved => "policy_approved",
            Trigger::PolicyRejected => "policy_rejected",
            Trigger::PolicyPublished => "policy_published",
            Trigger::PolicyArchived => "policy_archived",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name() == name.trim().to_ascii_lowercase())
    }

    /// The source kind this trigger applies to.
    pub fn kind(&self) -> SourceKind {
        match self {
            Trigger::RiskDetected
            | Trigger::RiskEscalated
            | Trigger::MitigationOverdue
            | Trigger::MitigationCompleted
            | Trigger::RiskApproved
            | Trigger::RiskRejected => SourceKind::Risk,
            Trigger::ComplianceBreach
            | Trigger::ComplianceOverdue
            | Trigger::ComplianceApproved
            | Trigger::ComplianceRejected
            | Trigger::ComplianceReviewRequired => SourceKind::Compliance,
            Trigger::AuditFinding
            | Trigger::AuditOverdue
            | Trigger::AuditApproved
            | Trigger::AuditRejected
            | Trigger::AuditScheduled => SourceKind::Audit,
            Trigger::IncidentDetected
            | Trigger::IncidentEscalated
            | Trigger::IncidentResolved
            | Trigger::IncidentOverdue => SourceKind::Incident,
            Trigger::PolicyReviewDue
            | Trigger::PolicyUpdateRequired
            | Trigger::PolicyApprovalNeeded
            | Trigger::PolicyExpirationWarning
            | Trigger::PolicyApproved
            | Trigger::PolicyRejected
            | Trigger::PolicyPublished
            | Trigger::PolicyArchived => SourceKind::Policy,
        }
    }

    /// The trigger fired when a record of `kind` is first created.
    pub fn created_for(kind: SourceKind) -> Trigger {
        match kind {
            SourceKind::Risk => Trigger::RiskDetected,
            SourceKind::Compliance => Trigger::ComplianceReviewRequired,
            SourceKind::Audit => Trigger::AuditScheduled,
            SourceKind::Incident => Trigger::IncidentDetected,
            SourceKind::Policy => Trigger::PolicyApprovalNeeded,
        }
    }

    /// The approval trigger for `kind`, where one exists.
    pub fn approved_for(kind: SourceKind) -> Option<Trigger> {
        match kind {
            SourceKind::Risk => Some(Trigger::RiskApproved),
            SourceKind::Compliance => Some(Trigger::ComplianceApproved),
            SourceKind::Audit => Some(Trigger::AuditApproved),
            SourceKind::Policy => Some(Trigger::PolicyApproved),
            SourceKind::Incident => None,
        }
    }

    /// The rejection trigger for `kind`, where one exists.
    pub fn rejected_for(kind: SourceKind) -> Option<Trigger> {
        match kind {
            SourceKind::Risk => Some(Trigger::RiskRejected),
            SourceKind::Compliance => Some(Trigger::ComplianceRejected),
            SourceKind::Audit => Some(Trigger::AuditRejected),
            SourceKind::Policy => Some(Trigger::PolicyRejected),
            SourceKind::Incident => None,
        }
    }

    /// The verb rendered into the event title (`"<verb>: <title>"`).
    pub fn title_verb(&self) -> &'static str {
        match self {
            Trigger::RiskDetected => "Risk Detected",
            Trigger::RiskEscalated => "Risk Escalated",
            Trigger::MitigationOverdue => "Mitigation Overdue",
            Trigger::MitigationCompleted => "Mitigation Completed",
            Trigger::RiskApproved => "Risk Approved",
            Trigger::RiskRejected => "Risk Rejected",
            Trigger::ComplianceBreach => "Compliance Breach",
            Trigger::ComplianceOverdue => "Compliance Overdue",
            Trigger::ComplianceApproved => "Compliance Approved",
            Trigger::ComplianceRejected => "Compliance Rejected",
            Trigger::ComplianceReviewRequired => "Compliance Review Required",
            Trigger::AuditFinding => "Audit Finding",
            Trigger::AuditOverdue => "Audit Overdue",
            Trigger::AuditApproved => "Audit Approved",
            Trigger::AuditRejected => "Audit Rejected",
            Trigger::AuditScheduled => "Audit Scheduled",
            Trigger::IncidentDetected => "Incident Detected",
            Trigger::IncidentEscalated => "Incident Escalated",
            Trigger::IncidentResolved => "Incident Resolved",
            Trigger::IncidentOverdue => "Incident Overdue",
            Trigger::PolicyReviewDue => "Policy Review Due",
            Trigger::PolicyUpdateRequired => "Policy Update Required",
            Trigger::PolicyApprovalNeeded => "Policy Approval Needed",
            Trigger::PolicyExpirationWarning => "Policy Expiration Warning",
            Trigger::PolicyApproved => "Policy Approved",
            Trigger::PolicyRejected => "Policy Rejected",
            Trigger::PolicyPublished => "Policy Published",
            Trigger::PolicyArchived => "Policy Archived",
        }
    }

    /// The canonical substring used to find an existing open event of
    /// the same family.
    pub fn dedup_hint(&self) -> &'static str {
        match self {
            Trigger::RiskEscalated | Trigger::IncidentEscalated => "Escalated",
            Trigger::ComplianceReviewRequired => "Review Required",
            other => other.title_verb(),
        }
    }

    /// The sentence leading the event description.
    pub fn description_lead(&self) -> &'static str {
        match self {
            Trigger::RiskDetected => "A new risk has been identified and requires review",
            Trigger::RiskEscalated => "Risk severity has been raised and needs attention",
            Trigger::MitigationOverdue => "The mitigation deadline for this risk has passed",
            Trigger::MitigationCompleted => "Mitigation work for this risk has been completed",
            Trigger::RiskApproved => "The risk has been approved",
            Trigger::RiskRejected => "The risk has been rejected",
            Trigger::ComplianceBreach => "A compliance breach has been recorded",
            Trigger::ComplianceOverdue => "The compliance deadline has passed",
            Trigger::ComplianceApproved => "The compliance item has been approved",
            Trigger::ComplianceRejected => "The compliance item has been rejected",
            Trigger::ComplianceReviewRequired => {
                "The compliance item is awaiting review"
            }
            Trigger::AuditFinding => "An audit finding has been recorded",
            Trigger::AuditOverdue => "The audit deadline has passed",
            Trigger::AuditApproved => "The audit has been approved",
            Trigger::AuditRejected => "The audit has been rejected",
            Trigger::AuditScheduled => "An audit has been scheduled",
            Trigger::IncidentDetected => "A new incident has been reported",
            Trigger::IncidentEscalated => "Incident severity has been raised",
            Trigger::IncidentResolved => "The incident has been resolved",
            Trigger::IncidentOverdue => "The incident response deadline has passed",
            Trigger::PolicyReviewDue => "The policy is due for periodic review",
            Trigger::PolicyUpdateRequired => "The policy requires an update",
            Trigger::PolicyApprovalNeeded => "The policy is awaiting approval",
            Trigger::PolicyExpirationWarning => "The policy is approaching expiration",
            Trigger::PolicyApproved => "The policy has been approved",
            Trigger::PolicyRejected => "The policy has been rejected",
            Trigger::PolicyPublished => "The policy has been published",
            Trigger::PolicyArchived => "The policy has been archived",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
