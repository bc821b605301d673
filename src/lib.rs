// Export modules for library usage
pub mod ai;
pub mod api;
pub mod authz;
pub mod cli;
pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod repo;
pub mod runner;
pub mod scanner;
pub mod scoring;
pub mod synth;

// Re-export commonly used types
pub use crate::core::{
    Criticality, Event, EventDraft, EventId, EventStatus, MitigationStatus, Priority, RecordId,
    RecurrenceType, Risk, RiskId, RiskStatus, RiskType, RoleBinding, SourceKind, SourceRecord,
    TenantId, TenantScope, User, UserId,
};

pub use crate::errors::{CoreError, CoreResult};

pub use crate::ai::{Completer, CompleterError, ParsedRisk, RiskPromptBuilder};

pub use crate::api::{CoreApi, RequestContext};

pub use crate::authz::{Role, RoleGate};

pub use crate::config::RiskmapConfig;

pub use crate::events::{EventFactory, EventTriggerEngine, NotificationSink, Trigger};

pub use crate::repo::{
    ApprovalRequest, CommitQueue, InMemoryRepo, Page, Repo, RiskFilter, SourceObserver,
};

pub use crate::runner::{AsyncRiskRunner, JobState, JobStatus, SubmitOutcome};

pub use crate::scanner::{PeriodicScanner, ScanOutcome};

pub use crate::synth::{RiskSynthesizer, Selection};
