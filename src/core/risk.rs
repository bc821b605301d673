//! Generated risk records and the shared priority scale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::RiskId;
use super::source::Criticality;
use super::tenant::TenantId;

/// Priority of a derived artifact (event or risk).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "Critical",
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "critical" => Some(Priority::Critical),
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Criticality> for Priority {
    fn from(criticality: Criticality) -> Self {
        match criticality {
            Criticality::Critical => Priority::Critical,
            Criticality::High => Priority::High,
            Criticality::Medium => Priority::Medium,
            Criticality::Low => Priority::Low,
        }
    }
}

/// Lifecycle status of a generated risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskStatus {
    Open,
    Mitigated,
    Closed,
}

impl RiskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskStatus::Open => "Open",
            RiskStatus::Mitigated => "Mitigated",
            RiskStatus::Closed => "Closed",
        }
    }
}

impl Default for RiskStatus {
    fn default() -> Self {
        RiskStatus::Open
    }
}

/// Temporal classification of a generated risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskType {
    Current,
    Emerging,
}

impl RiskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskType::Current => "Current",
            RiskType::Emerging => "Emerging",
        }
    }
}

impl Default for RiskType {
    fn default() -> Self {
        RiskType::Current
    }
}

/// An AI- or heuristically-derived risk record.
///
/// `entity`, `data`, and `row` identify the source selection the risk
/// was generated from; the score is always derived from the three
/// ratings (see the scoring module) and never stored independently of
/// them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    pub id: RiskId,
    pub tenant: TenantId,
    pub title: String,
    pub description: String,
    /// Likelihood rating, 1-5.
    pub likelihood: u8,
    /// Impact rating, 1-5.
    pub impact: u8,
    /// Exposure rating, 1-5.
    pub exposure: u8,
    /// Composite score, 0-100.
    pub score: u8,
    pub priority: Priority,
    pub status: RiskStatus,
    pub risk_type: RiskType,
    pub ai_explanation: String,
    /// One to five short mitigation suggestions, in output order.
    pub suggested_mitigations: Vec<String>,
    /// Module tag of the source selection.
    pub entity: String,
    /// Source table tag.
    pub data: String,
    /// Source row id, as a string.
    pub row: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
