//! Typed identifiers and display-id formats.
//!
//! Risk ids render as `R-` followed by a zero-padded integer with a
//! minimum of four digits; event display ids as `EVT-` with the same
//! padding. Sequences are per tenant and gap-tolerant: allocation takes
//! the highest existing suffix rather than counting rows.

use serde::{Deserialize, Serialize};
use std::fmt;

/// User identifier, owned by the external identity subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Identifier of a source record within its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Display id of a generated risk (`R-1000`, `R-1001`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskId(String);

impl RiskId {
    /// Format a sequence number as a risk id.
    pub fn from_sequence(sequence: u32) -> Self {
        Self(format!("R-{:04}", sequence))
    }

    /// Parse the numeric suffix back out, if the id is well-formed.
    pub fn sequence(&self) -> Option<u32> {
        self.0.strip_prefix("R-")?.parse().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RiskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Display id of a generated event (`EVT-0001`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn from_sequence(sequence: u32) -> Self {
        Self(format!("EVT-{:04}", sequence))
    }

    pub fn sequence(&self) -> Option<u32> {
        self.0.strip_prefix("EVT-")?.parse().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
