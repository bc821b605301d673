//! Role names and their module families.

use crate::core::SourceKind;
use std::fmt;

/// A named role. Unknown role names are preserved verbatim so that the
/// gate can fall back to module-based filtering for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    GrcAdministrator,
    AuditManager,
    InternalAuditor,
    ExternalAuditor,
    AuditReviewer,
    ComplianceManager,
    ComplianceOfficer,
    ComplianceApprover,
    PolicyManager,
    PolicyApprover,
    RiskManager,
    RiskAnalyst,
    RiskReviewer,
    IncidentResponseManager,
    IncidentAnalyst,
    Other(String),
}

impl Role {
    /// Parse a role name, matching the canonical labels case-insensitively.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "grc administrator" => Role::GrcAdministrator,
            "audit manager" => Role::AuditManager,
            "internal auditor" => Role::InternalAuditor,
            "external auditor" => Role::ExternalAuditor,
            "audit reviewer" => Role::AuditReviewer,
            "compliance manager" => Role::ComplianceManager,
            "compliance officer" => Role::ComplianceOfficer,
            "compliance approver" => Role::ComplianceApprover,
            "policy manager" => Role::PolicyManager,
            "policy approver" => Role::PolicyApprover,
            "risk manager" => Role::RiskManager,
            "risk analyst" => Role::RiskAnalyst,
            "risk reviewer" => Role::RiskReviewer,
            "incident response manager" => Role::IncidentResponseManager,
            "incident analyst" => Role::IncidentAnalyst,
            _ => Role::Other(name.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::GrcAdministrator => "GRC Administrator",
            Role::AuditManager => "Audit Manager",
            Role::InternalAuditor => "Internal Auditor",
            Role::ExternalAuditor => "External Auditor",
            Role::AuditReviewer => "Audit Reviewer",
            Role::ComplianceManager => "Compliance Manager",
            Role::ComplianceOfficer => "Compliance Officer",
            Role::ComplianceApprover => "Compliance Approver",
            Role::PolicyManager => "Policy Manager",
            Role::PolicyApprover => "Policy Approver",
            Role::RiskManager => "Risk Manager",
            Role::RiskAnalyst => "Risk Analyst",
            Role::RiskReviewer => "Risk Reviewer",
            Role::IncidentResponseManager => "Incident Response Manager",
            Role::IncidentAnalyst => "Incident Analyst",
            Role::Other(name) => name,
        }
    }

    /// Administrators and the audit family see every event.
    pub fn has_global_event_view(&self) -> bool {
        matches!(
            self,
            Role::GrcAdministrator
                | Role::AuditManager
                | Role::InternalAuditor
                | Role::ExternalAuditor
                | Role::AuditReviewer
        )
    }

    /// Whether this is one of the canonical role names.
    pub fn is_known(&self) -> bool {
        !matches!(self, Role::Other(_))
    }

    /// Whether this role belongs to the family responsible for `kind`.
    pub fn matches_family(&self, kind: SourceKind) -> bool {
        match kind {
            SourceKind::Compliance => matches!(
                self,
                Role::ComplianceManager | Role::ComplianceOfficer | Role::ComplianceApprover
            ),
            SourceKind::Policy => matches!(self, Role::PolicyManager | Role::PolicyApprover),
            SourceKind::Audit => matches!(
                self,
                Role::AuditManager
                    | Role::InternalAuditor
                    | Role::ExternalAuditor
                    | Role::AuditReviewer
            ),
            SourceKind::Risk => matches!(
                self,
                Role::RiskManager | Role::RiskAnalyst | Role::RiskReviewer
            ),
            SourceKind::Incident => {
                matches!(self, Role::IncidentResponseManager | Role::IncidentAnalyst)
            }
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_names() {
        assert_eq!(Role::parse("GRC Administrator"), Role::GrcAdministrator);
        assert_eq!(Role::parse("compliance officer"), Role::ComplianceOfficer);
        assert_eq!(
            Role::parse("  Incident Response Manager "),
            Role::IncidentResponseManager
        );
    }

    #[test]
    fn test_unknown_role_is_preserved() {
        let role = Role::parse("Vendor Manager");
        assert_eq!(role, Role::Other("Vendor Manager".to_string()));
        assert!(!role.is_known());
        assert_eq!(role.as_str(), "Vendor Manager");
    }

    #[test]
    fn test_global_view_roles() {
        assert!(Role::GrcAdministrator.has_global_event_view());
        assert!(Role::ExternalAuditor.has_global_event_view());
        assert!(!Role::ComplianceOfficer.has_global_event_view());
        assert!(!Role::Other("Vendor Manager".into()).has_global_event_view());
    }

    #[test]
    fn test_family_membership() {
        assert!(Role::ComplianceOfficer.matches_family(SourceKind::Compliance));
        assert!(!Role::ComplianceOfficer.matches_family(SourceKind::Risk));
        assert!(Role::RiskAnalyst.matches_family(SourceKind::Risk));
        assert!(Role::PolicyApprover.matches_family(SourceKind::Policy));
        assert!(Role::IncidentAnalyst.matches_family(SourceKind::Incident));
        assert!(Role::AuditReviewer.matches_family(SourceKind::Audit));
    }
}
