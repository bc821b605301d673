//! Notification delivery seam.
//!
//! The core only knows one fire-and-forget operation; delivery
//! transport, templating, and retries belong to the collaborator
//! behind the trait.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::Event;

/// A resolved notification recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// Relationship to the event: Owner, Reviewer, or Creator.
    pub role: String,
    pub email: String,
    pub display_name: String,
}

/// The opaque template payload handed to the sink.
///
/// Consumers rely on the order: recipient display-name, event title,
/// description, creator name, category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventNotification {
    pub template_data: Vec<String>,
}

impl EventNotification {
    pub fn for_recipient(recipient: &Recipient, event: &Event, creator_name: &str) -> Self {
        Self {
            template_data: vec![
                recipient.display_name.clone(),
                event.title.clone(),
                event.description.clone(),
                creator_name.to_string(),
                event.category.clone(),
            ],
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification transport failed: {0}")]
    Transport(String),
}

/// Fire-and-forget notification sink.
pub trait NotificationSink: Send + Sync {
    fn event_created(
        &self,
        recipient: &Recipient,
        event: &Event,
        notification: &EventNotification,
    ) -> Result<(), NotifyError>;
}

/// Sink that drops everything. The default for CLI and tests that do
/// not observe notifications.
pub struct NullSink;

impl NotificationSink for NullSink {
    fn event_created(
        &self,
        _recipient: &Recipient,
        _event: &Event,
        _notification: &EventNotification,
    ) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Sink that records every send, for assertions.
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<(Recipient, EventNotification)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(Recipient, EventNotification)> {
        self.sent.lock().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn event_created(
        &self,
        recipient: &Recipient,
        _event: &Event,
        notification: &EventNotification,
    ) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .push((recipient.clone(), notification.clone()));
        Ok(())
    }
}

/// Sink that always fails, for exercising the best-effort loop.
pub struct FailingSink;

impl NotificationSink for FailingSink {
    fn event_created(
        &self,
        recipient: &Recipient,
        _event: &Event,
        _notification: &EventNotification,
    ) -> Result<(), NotifyError> {
        Err(NotifyError::Transport(format!(
            "smtp unreachable for {}",
            recipient.email
        )))
    }
}
