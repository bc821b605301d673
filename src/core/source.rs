//! Source records: the upstream business entities whose lifecycle
//! transitions drive event creation.
//!
//! The core reads these records and reacts to their mutations; it never
//! writes them outside the staging transaction owned by the upstream
//! subsystem.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{RecordId, UserId};
use super::tenant::TenantId;

/// The five source-record kinds the core reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Risk,
    Compliance,
    Audit,
    Incident,
    Policy,
}

impl SourceKind {
    pub const ALL: [SourceKind; 5] = [
        SourceKind::Risk,
        SourceKind::Compliance,
        SourceKind::Audit,
        SourceKind::Incident,
        SourceKind::Policy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Risk => "risk",
            SourceKind::Compliance => "compliance",
            SourceKind::Audit => "audit",
            SourceKind::Incident => "incident",
            SourceKind::Policy => "policy",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "risk" => Some(SourceKind::Risk),
            "compliance" => Some(SourceKind::Compliance),
            "audit" => Some(SourceKind::Audit),
            "incident" => Some(SourceKind::Incident),
            "policy" => Some(SourceKind::Policy),
            _ => None,
        }
    }

    /// The module label derived from this kind.
    pub fn module(&self) -> &'static str {
        match self {
            SourceKind::Risk => "Risk Management",
            SourceKind::Compliance => "Compliance Management",
            SourceKind::Audit => "Audit Management",
            SourceKind::Incident => "Incident Management",
            SourceKind::Policy => "Policy Management",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Criticality of a source record (severity for incidents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Criticality {
    Critical,
    High,
    Medium,
    Low,
}

impl Criticality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Criticality::Critical => "Critical",
            Criticality::High => "High",
            Criticality::Medium => "Medium",
            Criticality::Low => "Low",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "critical" => Some(Criticality::Critical),
            "high" => Some(Criticality::High),
            "medium" => Some(Criticality::Medium),
            "low" => Some(Criticality::Low),
            _ => None,
        }
    }

    /// Whether this level counts as raised for escalation purposes.
    pub fn is_elevated(&self) -> bool {
        matches!(self, Criticality::Critical | Criticality::High)
    }

    fn rank(&self) -> u8 {
        match self {
            Criticality::Critical => 3,
            Criticality::High => 2,
            Criticality::Medium => 1,
            Criticality::Low => 0,
        }
    }

    /// True when `self` is strictly more severe than `other`.
    pub fn raised_from(&self, other: &Criticality) -> bool {
        self.rank() > other.rank()
    }
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mitigation progress on a risk instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MitigationStatus {
    YetToStart,
    WorkInProgress,
    Completed,
}

impl MitigationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MitigationStatus::YetToStart => "Yet to Start",
            MitigationStatus::WorkInProgress => "Work In Progress",
            MitigationStatus::Completed => "Completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "yet to start" => Some(MitigationStatus::YetToStart),
            "work in progress" => Some(MitigationStatus::WorkInProgress),
            "completed" => Some(MitigationStatus::Completed),
            _ => None,
        }
    }

    /// Mitigation is outstanding while not completed.
    pub fn is_outstanding(&self) -> bool {
        !matches!(self, MitigationStatus::Completed)
    }
}

/// A polymorphic source record.
///
/// Statuses are free-form strings owned by the upstream subsystems;
/// the trigger engine compares them case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub id: RecordId,
    pub tenant: TenantId,
    pub kind: SourceKind,
    pub title: String,
    pub description: String,
    pub criticality: Criticality,
    pub status: String,
    /// Mitigation due date for risks, review deadline elsewhere.
    pub due_date: Option<NaiveDate>,
    pub mitigation_status: Option<MitigationStatus>,
    /// Compliance framework tag where applicable (e.g. "ISO 27001").
    pub framework: Option<String>,
    pub owner: Option<UserId>,
    pub reviewer: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SourceRecord {
    /// Case-insensitive status comparison.
    pub fn status_is(&self, status: &str) -> bool {
        self.status.eq_ignore_ascii_case(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse_is_case_insensitive() {
        assert_eq!(SourceKind::parse("Risk"), Some(SourceKind::Risk));
        assert_eq!(SourceKind::parse("POLICY"), Some(SourceKind::Policy));
        assert_eq!(SourceKind::parse("vendor"), None);
    }

    #[test]
    fn test_module_derivation_table() {
        assert_eq!(SourceKind::Risk.module(), "Risk Management");
        assert_eq!(SourceKind::Compliance.module(), "Compliance Management");
        assert_eq!(SourceKind::Audit.module(), "Audit Management");
        assert_eq!(SourceKind::Incident.module(), "Incident Management");
        assert_eq!(SourceKind::Policy.module(), "Policy Management");
    }

    #[test]
    fn test_criticality_raised_from() {
        assert!(Criticality::High.raised_from(&Criticality::Medium));
        assert!(Criticality::Critical.raised_from(&Criticality::High));
        assert!(!Criticality::Medium.raised_from(&Criticality::Medium));
        assert!(!Criticality::Low.raised_from(&Criticality::High));
    }

    #[test]
    fn test_mitigation_status_outstanding() {
        assert!(MitigationStatus::YetToStart.is_outstanding());
        assert!(MitigationStatus::WorkInProgress.is_outstanding());
        assert!(!MitigationStatus::Completed.is_outstanding());
    }
}
