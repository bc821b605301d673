//! Workflow events materialized from source-record lifecycle triggers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{EventId, RecordId, UserId};
use super::risk::Priority;
use super::source::SourceKind;
use super::tenant::TenantId;

/// Workflow status of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
    PendingReview,
    UnderReview,
    Approved,
    Rejected,
    Completed,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::PendingReview => "Pending Review",
            EventStatus::UnderReview => "Under Review",
            EventStatus::Approved => "Approved",
            EventStatus::Rejected => "Rejected",
            EventStatus::Completed => "Completed",
        }
    }

    /// Open events are the dedup targets: a later trigger of the same
    /// family is a no-op while one of these exists.
    pub fn is_open(&self) -> bool {
        matches!(self, EventStatus::PendingReview | EventStatus::UnderReview)
    }
}

/// Recurrence of an event. Only non-recurring events exist in the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecurrenceType {
    NonRecurring,
}

impl RecurrenceType {
    pub fn as_str(&self) -> &'static str {
        "Non-Recurring"
    }
}

/// A fully built event awaiting insertion.
///
/// The repository assigns the numeric id, the display id, and the
/// created/updated timestamps at insert time.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub tenant: TenantId,
    pub title: String,
    pub description: String,
    pub linked_record_type: SourceKind,
    pub linked_record_id: RecordId,
    pub linked_record_name: String,
    pub category: String,
    pub priority: Priority,
    pub status: EventStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub recurrence: RecurrenceType,
    pub framework: Option<String>,
    pub owner: Option<UserId>,
    pub reviewer: Option<UserId>,
    pub creator: Option<UserId>,
}

impl EventDraft {
    /// Materialize the draft with repository-assigned identity.
    pub fn into_event(self, id: u64, display_id: EventId, now: DateTime<Utc>) -> Event {
        Event {
            id,
            display_id,
            tenant: self.tenant,
            title: self.title,
            description: self.description,
            linked_record_type: self.linked_record_type,
            linked_record_id: self.linked_record_id,
            linked_record_name: self.linked_record_name,
            category: self.category,
            priority: self.priority,
            status: self.status,
            start_date: self.start_date,
            end_date: self.end_date,
            recurrence: self.recurrence,
            framework: self.framework,
            owner: self.owner,
            reviewer: self.reviewer,
            creator: self.creator,
            is_template: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A persisted workflow event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: u64,
    pub display_id: EventId,
    pub tenant: TenantId,
    pub title: String,
    pub description: String,
    pub linked_record_type: SourceKind,
    pub linked_record_id: RecordId,
    pub linked_record_name: String,
    pub category: String,
    pub priority: Priority,
    pub status: EventStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub recurrence: RecurrenceType,
    pub framework: Option<String>,
    pub owner: Option<UserId>,
    pub reviewer: Option<UserId>,
    pub creator: Option<UserId>,
    pub is_template: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Case-insensitive title substring match, used for dedup hints.
    pub fn title_contains(&self, hint: &str) -> bool {
        self.title.to_lowercase().contains(&hint.to_lowercase())
    }
}
