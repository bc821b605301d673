//! Event materialization: triggers, the factory matrices, the commit
//! hook engine, and the notification seam.

pub mod engine;
pub mod factory;
pub mod notify;
pub mod trigger;

pub use engine::EventTriggerEngine;
pub use factory::EventFactory;
pub use notify::{
    EventNotification, FailingSink, NotificationSink, NotifyError, NullSink, Recipient,
    RecordingSink,
};
pub use trigger::Trigger;
