//! Portable notification backend persisted in the key-value store.
//!
//! Pending alerts live under [`NOTIFICATION_QUEUE_KEY`] as a JSON array.
//! A host loop (or the CLI) calls [`QueueBackend::take_due`] to fire them.

use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime};
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::service::{NotificationBackend, PermissionStatus, ScheduledNotification};
use crate::error::NotificationError;
use crate::storage::{ChannelConfig, KeyValueStore};

pub const NOTIFICATION_QUEUE_KEY: &str = "@cronograma_notifications";

pub struct QueueBackend {
    storage: Arc<dyn KeyValueStore>,
    allow: bool,
    status: Mutex<PermissionStatus>,
    channel: Mutex<Option<ChannelConfig>>,
    // Serializes read-modify-write cycles on the queue blob.
    write_lock: tokio::sync::Mutex<()>,
}

impl QueueBackend {
    /// `allow` is what a permission prompt answers.
    pub fn new(storage: Arc<dyn KeyValueStore>, allow: bool) -> Self {
        Self {
            storage,
            allow,
            status: Mutex::new(PermissionStatus::Undetermined),
            channel: Mutex::new(None),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Channel applied by the last successful permission grant.
    pub fn channel(&self) -> Option<ChannelConfig> {
        self.channel.lock().ok().and_then(|c| c.clone())
    }

    async fn read(&self) -> Result<Vec<ScheduledNotification>, NotificationError> {
        let blob = self
            .storage
            .get(NOTIFICATION_QUEUE_KEY)
            .await
            .map_err(|e| NotificationError::Backend(e.to_string()))?;
        match blob {
            Some(blob) => serde_json::from_str(&blob)
                .map_err(|e| NotificationError::Backend(format!("corrupt queue: {e}"))),
            None => Ok(Vec::new()),
        }
    }

    async fn write(&self, queue: &[ScheduledNotification]) -> Result<(), NotificationError> {
        let blob = serde_json::to_string(queue)
            .map_err(|e| NotificationError::Backend(e.to_string()))?;
        self.storage
            .set(NOTIFICATION_QUEUE_KEY, &blob)
            .await
            .map_err(|e| NotificationError::Backend(e.to_string()))
    }

    /// Remove and return every alert due at `now`. Daily alerts are
    /// re-queued for their next occurrence after `now`.
    pub async fn take_due(
        &self,
        now: NaiveDateTime,
    ) -> Result<Vec<ScheduledNotification>, NotificationError> {
        let _guard = self.write_lock.lock().await;
        let queue = self.read().await?;

        let (due, mut remaining): (Vec<_>, Vec<_>) =
            queue.into_iter().partition(|n| n.fire_at <= now);
        if due.is_empty() {
            return Ok(due);
        }

        for fired in due.iter().filter(|n| n.repeat_daily) {
            let mut next = fired.clone();
            while next.fire_at <= now {
                next.fire_at += Duration::days(1);
            }
            remaining.push(next);
        }

        self.write(&remaining).await?;
        debug!(fired = due.len(), "drained due notifications");
        Ok(due)
    }
}

#[async_trait]
impl NotificationBackend for QueueBackend {
    async fn permission_status(&self) -> Result<PermissionStatus, NotificationError> {
        self.status
            .lock()
            .map(|s| *s)
            .map_err(|_| NotificationError::Backend("permission state poisoned".into()))
    }

    async fn request_permission(&self) -> Result<PermissionStatus, NotificationError> {
        let answer = if self.allow {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        };
        let mut status = self
            .status
            .lock()
            .map_err(|_| NotificationError::Backend("permission state poisoned".into()))?;
        *status = answer;
        Ok(answer)
    }

    async fn configure_channel(&self, channel: &ChannelConfig) -> Result<(), NotificationError> {
        if let Ok(mut slot) = self.channel.lock() {
            *slot = Some(channel.clone());
        }
        Ok(())
    }

    async fn schedule(&self, notification: ScheduledNotification) -> Result<(), NotificationError> {
        let _guard = self.write_lock.lock().await;
        let mut queue = self.read().await?;
        queue.retain(|n| n.identifier != notification.identifier);
        queue.push(notification);
        queue.sort_by_key(|n| n.fire_at);
        self.write(&queue).await
    }

    async fn cancel(&self, identifier: &str) -> Result<(), NotificationError> {
        let _guard = self.write_lock.lock().await;
        let mut queue = self.read().await?;
        let before = queue.len();
        queue.retain(|n| n.identifier != identifier);
        if queue.len() == before {
            return Ok(());
        }
        self.write(&queue).await
    }

    async fn cancel_all(&self) -> Result<(), NotificationError> {
        let _guard = self.write_lock.lock().await;
        self.storage
            .remove(NOTIFICATION_QUEUE_KEY)
            .await
            .map_err(|e| NotificationError::Backend(e.to_string()))
    }

    async fn pending(&self) -> Result<Vec<ScheduledNotification>, NotificationError> {
        self.read().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{NotificationRequest, NotificationScheduler, NotificationService};
    use crate::storage::{MemoryStore, NotificationsConfig};

    fn at(s: &str) -> NaiveDateTime {
        s.parse().unwrap()
    }

    fn request(identifier: &str, time: &str, repeat_daily: bool) -> NotificationRequest {
        NotificationRequest {
            identifier: identifier.to_string(),
            title: identifier.to_string(),
            body: String::new(),
            date: "2024-06-02".parse().unwrap(),
            time: time.to_string(),
            repeat_daily,
        }
    }

    fn service(allow: bool) -> NotificationService<QueueBackend> {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        NotificationService::new(QueueBackend::new(storage, allow), &NotificationsConfig::default())
    }

    #[tokio::test]
    async fn queue_orders_by_fire_time_and_drains_due() {
        let service = service(true);
        let now = at("2024-06-01T12:00:00");
        service
            .schedule_relative_to(&request("late", "18:00", false), now)
            .await
            .unwrap();
        service
            .schedule_relative_to(&request("early", "08:00", false), now)
            .await
            .unwrap();

        let pending = service.scheduled_notifications().await;
        let ids: Vec<_> = pending.iter().map(|n| n.identifier.as_str()).collect();
        assert_eq!(ids, ["early", "late"]);
        assert!(service.backend().channel().is_some());

        let due = service
            .backend()
            .take_due(at("2024-06-02T09:00:00"))
            .await
            .unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].identifier, "early");
        assert_eq!(service.scheduled_notifications().await.len(), 1);
    }

    #[tokio::test]
    async fn daily_alert_is_requeued() {
        let service = service(true);
        service
            .schedule_relative_to(&request("meds", "08:00", true), at("2024-06-01T12:00:00"))
            .await
            .unwrap();

        let due = service
            .backend()
            .take_due(at("2024-06-04T10:00:00"))
            .await
            .unwrap();
        assert_eq!(due.len(), 1);

        let pending = service.scheduled_notifications().await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].fire_at, at("2024-06-05T08:00:00"));
    }

    #[tokio::test]
    async fn disabled_queue_denies_permission() {
        let service = service(false);
        assert!(!service.request_permissions().await);
        assert_eq!(
            service.backend().permission_status().await.unwrap(),
            PermissionStatus::Denied
        );
    }

    #[tokio::test]
    async fn cancel_unknown_and_cancel_all() {
        let service = service(true);
        service
            .schedule_relative_to(&request("a", "08:00", false), at("2024-06-01T12:00:00"))
            .await
            .unwrap();

        service.cancel_notification("missing").await;
        assert_eq!(service.scheduled_notifications().await.len(), 1);

        service.cancel_all_notifications().await;
        assert!(service.scheduled_notifications().await.is_empty());
    }
}
