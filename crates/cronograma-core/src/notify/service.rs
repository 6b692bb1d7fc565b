//! Notification scheduling over an OS-level backend.

use async_trait::async_trait;
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

use super::{NotificationRequest, NotificationScheduler};
use crate::error::NotificationError;
use crate::storage::{ChannelConfig, NotificationsConfig};

/// OS permission state for posting notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Undetermined,
    Granted,
    Denied,
}

/// Data attached to a scheduled alert so a tap can route back to the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    pub event_title: String,
    pub event_date: NaiveDate,
    pub event_time: String,
}

/// One alert as handed to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledNotification {
    pub identifier: String,
    pub title: String,
    pub body: String,
    pub fire_at: NaiveDateTime,
    #[serde(default)]
    pub repeat_daily: bool,
    pub data: NotificationData,
}

/// The device notification facility.
#[async_trait]
pub trait NotificationBackend: Send + Sync {
    async fn permission_status(&self) -> Result<PermissionStatus, NotificationError>;

    /// Prompt for permission and return the resulting status.
    async fn request_permission(&self) -> Result<PermissionStatus, NotificationError>;

    async fn configure_channel(&self, channel: &ChannelConfig) -> Result<(), NotificationError>;

    async fn schedule(&self, notification: ScheduledNotification) -> Result<(), NotificationError>;

    async fn cancel(&self, identifier: &str) -> Result<(), NotificationError>;

    async fn cancel_all(&self) -> Result<(), NotificationError>;

    async fn pending(&self) -> Result<Vec<ScheduledNotification>, NotificationError>;
}

/// [`NotificationScheduler`] implementation shared by every host.
pub struct NotificationService<B> {
    backend: B,
    title_prefix: String,
    default_body: String,
    channel: ChannelConfig,
    channel_configured: AtomicBool,
}

impl<B: NotificationBackend> NotificationService<B> {
    pub fn new(backend: B, config: &NotificationsConfig) -> Self {
        Self {
            backend,
            title_prefix: config.title_prefix.clone(),
            default_body: config.default_body.clone(),
            channel: config.channel.clone(),
            channel_configured: AtomicBool::new(false),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    async fn ensure_permission(&self) -> Result<bool, NotificationError> {
        let mut status = self.backend.permission_status().await?;
        if status != PermissionStatus::Granted {
            status = self.backend.request_permission().await?;
        }
        if status != PermissionStatus::Granted {
            info!("notification permission denied");
            return Ok(false);
        }

        if !self.channel_configured.load(Ordering::Acquire) {
            self.backend.configure_channel(&self.channel).await?;
            self.channel_configured.store(true, Ordering::Release);
        }
        Ok(true)
    }

    /// Schedule `request` treating `now` as the current local time.
    pub async fn schedule_relative_to(
        &self,
        request: &NotificationRequest,
        now: NaiveDateTime,
    ) -> Result<String, NotificationError> {
        if !self.request_permissions().await {
            return Err(NotificationError::PermissionDenied);
        }

        let fire_at = request.fire_at()?;
        if fire_at <= now {
            return Err(NotificationError::NotInFuture { fire_at });
        }

        self.cancel_notification(&request.identifier).await;

        let body = if request.body.trim().is_empty() {
            self.default_body.clone()
        } else {
            request.body.clone()
        };
        self.backend
            .schedule(ScheduledNotification {
                identifier: request.identifier.clone(),
                title: format!("{}{}", self.title_prefix, request.title),
                body,
                fire_at,
                repeat_daily: request.repeat_daily,
                data: NotificationData {
                    event_title: request.title.clone(),
                    event_date: request.date,
                    event_time: request.time.clone(),
                },
            })
            .await?;

        debug!(identifier = %request.identifier, %fire_at, "notification scheduled");
        Ok(request.identifier.clone())
    }
}

#[async_trait]
impl<B: NotificationBackend> NotificationScheduler for NotificationService<B> {
    async fn request_permissions(&self) -> bool {
        match self.ensure_permission().await {
            Ok(granted) => granted,
            Err(e) => {
                error!(error = %e, "failed to request notification permission");
                false
            }
        }
    }

    async fn schedule_event_notification(
        &self,
        request: &NotificationRequest,
    ) -> Result<String, NotificationError> {
        let result = self
            .schedule_relative_to(request, Local::now().naive_local())
            .await;
        if let Err(e) = &result {
            warn!(identifier = %request.identifier, error = %e, "failed to schedule notification");
        }
        result
    }

    async fn cancel_notification(&self, identifier: &str) {
        match self.backend.cancel(identifier).await {
            Ok(()) => debug!(identifier, "notification cancelled"),
            Err(e) => warn!(identifier, error = %e, "failed to cancel notification"),
        }
    }

    async fn cancel_all_notifications(&self) {
        match self.backend.cancel_all().await {
            Ok(()) => debug!("all notifications cancelled"),
            Err(e) => warn!(error = %e, "failed to cancel all notifications"),
        }
    }

    async fn scheduled_notifications(&self) -> Vec<ScheduledNotification> {
        self.backend.pending().await.unwrap_or_else(|e| {
            warn!(error = %e, "failed to list scheduled notifications");
            Vec::new()
        })
    }
}
