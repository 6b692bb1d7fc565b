//! Local notification scheduling.
//!
//! The store only sees [`NotificationScheduler`]. [`NotificationService`]
//! implements it over an OS-level [`NotificationBackend`]; [`QueueBackend`]
//! is a portable backend that keeps pending alerts in the key-value store.

mod queue;
mod service;

pub use queue::{QueueBackend, NOTIFICATION_QUEUE_KEY};
pub use service::{
    NotificationBackend, NotificationData, NotificationService, PermissionStatus,
    ScheduledNotification,
};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::NotificationError;
use crate::schedule::{parse_clock_time, Event};

/// How a scheduling identifier is derived from an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierScheme {
    /// The event's own unique id.
    #[default]
    EventId,
    /// `title + date` with no delimiter. Two events sharing a title on the
    /// same day share one alarm slot.
    TitleDate,
}

impl IdentifierScheme {
    pub fn identifier_for(self, event: &Event) -> String {
        match self {
            IdentifierScheme::EventId => event.id.clone(),
            IdentifierScheme::TitleDate => title_date_identifier(&event.title, event.date),
        }
    }
}

/// Legacy identifier format: title immediately followed by `YYYY-MM-DD`.
pub fn title_date_identifier(title: &str, date: NaiveDate) -> String {
    format!("{title}{}", date.format("%Y-%m-%d"))
}

/// Payload handed to the scheduler for one event alarm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub identifier: String,
    pub title: String,
    pub body: String,
    pub date: NaiveDate,
    /// `HH:mm` or `hh:mm AM/PM`.
    pub time: String,
    #[serde(default)]
    pub repeat_daily: bool,
}

impl NotificationRequest {
    /// Build the alarm request for `event`, firing at its alarm clock.
    pub fn for_event(event: &Event, scheme: IdentifierScheme) -> Self {
        Self {
            identifier: scheme.identifier_for(event),
            title: event.title.clone(),
            body: event.note.clone(),
            date: event.date,
            time: event.alarm_clock().to_string(),
            repeat_daily: event.repeat_alarm.unwrap_or(false),
        }
    }

    /// Local wall-clock instant this request fires at.
    pub fn fire_at(&self) -> Result<NaiveDateTime, NotificationError> {
        Ok(self.date.and_time(parse_clock_time(&self.time)?))
    }
}

/// Permission-gated one-shot alert scheduler.
#[async_trait]
pub trait NotificationScheduler: Send + Sync {
    /// Ask for (or confirm) permission to post notifications.
    async fn request_permissions(&self) -> bool;

    /// Schedule `request`, superseding any pending alert with the same
    /// identifier. Returns the identifier used.
    async fn schedule_event_notification(
        &self,
        request: &NotificationRequest,
    ) -> Result<String, NotificationError>;

    /// Best-effort cancel; failures are logged, never returned.
    async fn cancel_notification(&self, identifier: &str);

    /// Best-effort bulk cancel.
    async fn cancel_all_notifications(&self);

    /// Pending alerts, or empty if the backend cannot list them.
    async fn scheduled_notifications(&self) -> Vec<ScheduledNotification>;
}
