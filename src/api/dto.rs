//! Request and response shapes for the external surface.
//!
//! These are transport-agnostic: an HTTP adapter serializes them as-is
//! and maps `CoreError::http_status` onto the wire.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{Event, Risk};
use crate::runner::{JobResult, JobState};

/// Webhook ingest payload.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct WebhookRequest {
    pub trigger_type: Option<String>,
    pub record_type: Option<String>,
    pub record_id: Option<String>,
    /// Inline record details, accepted under any of the per-kind keys.
    #[serde(
        default,
        alias = "risk_details",
        alias = "compliance_details",
        alias = "audit_details",
        alias = "incident_details",
        alias = "policy_details"
    )]
    pub details: Option<serde_json::Value>,
}

/// Summary of a created event, echoed by webhook and scan responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedEventSummary {
    pub event_id: u64,
    pub event_id_generated: String,
    pub event_title: String,
}

impl From<&Event> for CreatedEventSummary {
    fn from(event: &Event) -> Self {
        Self {
            event_id: event.id,
            event_id_generated: event.display_id.as_str().to_string(),
            event_title: event.title.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub created_events: Vec<CreatedEventSummary>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanResponse {
    pub overdue_mitigations: usize,
    pub escalated_risks: usize,
    pub stale_compliance: usize,
    pub created_events: Vec<CreatedEventSummary>,
}

/// One row of the role-gated event listing.
#[derive(Debug, Clone, Serialize)]
pub struct EventItem {
    pub event_id: u64,
    pub event_id_generated: String,
    pub event_title: String,
    pub linked_record_type: String,
    pub linked_record_id: String,
    pub priority: String,
    pub status: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub owner: Option<String>,
    pub reviewer: Option<String>,
    pub framework: Option<String>,
    pub module: String,
}

impl From<&Event> for EventItem {
    fn from(event: &Event) -> Self {
        Self {
            event_id: event.id,
            event_id_generated: event.display_id.as_str().to_string(),
            event_title: event.title.clone(),
            linked_record_type: event.linked_record_type.as_str().to_string(),
            linked_record_id: event.linked_record_id.as_str().to_string(),
            priority: event.priority.as_str().to_string(),
            status: event.status.as_str().to_string(),
            start_date: event.start_date,
            end_date: event.end_date,
            owner: event.owner.as_ref().map(|u| u.as_str().to_string()),
            reviewer: event.reviewer.as_ref().map(|u| u.as_str().to_string()),
            framework: event.framework.clone(),
            module: event.linked_record_type.module().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventListResponse {
    pub events: Vec<EventItem>,
    pub total_count: usize,
}

/// Risk listing query parameters.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RiskQuery {
    pub entity: Option<String>,
    pub data: Option<String>,
    pub row: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskPageResponse {
    pub results: Vec<Risk>,
    pub count: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

/// Risk generation request: either an approval id or a full selection.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct GenerateRequest {
    pub approval_id: Option<String>,
    pub entity: Option<String>,
    pub table: Option<String>,
    pub row_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateResponse {
    /// `started` or `already_running`.
    pub status: String,
    /// The job key to poll status with.
    pub key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobStatusResponse {
    pub status: JobState,
    pub processing_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_request_accepts_kind_specific_details_key() {
        let req: WebhookRequest = serde_json::from_str(
            r#"{
                "trigger_type": "risk_detected",
                "record_type": "risk",
                "risk_details": {"title": "Patching behind"}
            }"#,
        )
        .unwrap();
        assert_eq!(req.trigger_type.as_deref(), Some("risk_detected"));
        assert!(req.details.is_some());

        let req: WebhookRequest = serde_json::from_str(
            r#"{"trigger_type": "policy_approved", "record_type": "policy", "policy_details": {}}"#,
        )
        .unwrap();
        assert!(req.details.is_some());
    }

    #[test]
    fn test_job_status_omits_empty_fields() {
        let body = serde_json::to_value(JobStatusResponse {
            status: JobState::Running,
            processing_time: 1.5,
            completed_at: None,
            result: None,
            error: None,
        })
        .unwrap();
        assert_eq!(body["status"], "running");
        assert!(body.get("completed_at").is_none());
        assert!(body.get("result").is_none());
    }
}
