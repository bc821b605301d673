//! Canonical domain model: tenants, identifiers, users, source records,
//! events, and risks.

pub mod event;
pub mod ids;
pub mod risk;
pub mod source;
pub mod tenant;
pub mod user;

pub use event::{Event, EventDraft, EventStatus, RecurrenceType};
pub use ids::{EventId, RecordId, RiskId, UserId};
pub use risk::{Priority, Risk, RiskStatus, RiskType};
pub use source::{Criticality, MitigationStatus, SourceKind, SourceRecord};
pub use tenant::{TenantId, TenantScope};
pub use user::{RoleBinding, User};
