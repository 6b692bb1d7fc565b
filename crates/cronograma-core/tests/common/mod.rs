//! Shared fakes for store integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use cronograma_core::notify::ScheduledNotification;
use cronograma_core::{
    CronogramaStore, KeyValueStore, MemoryStore, NotificationError, NotificationRequest,
    NotificationScheduler, StorageError, StoreOptions,
};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use std::sync::{Arc, Mutex};

/// Memory store whose reads and writes can be switched to fail, and whose
/// reads can be slowed down.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    pub fail_writes: AtomicBool,
    pub fail_reads: AtomicBool,
    read_delay_ms: AtomicU64,
}

impl FlakyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_read_delay(&self, delay: Duration) {
        self.read_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let delay = self.read_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("read failed".into()));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("disk full".into()));
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Schedule(String),
    /// Identifier plus the events blob as it was when the cancel arrived.
    Cancel(String, Option<String>),
    CancelAll,
}

/// Scheduler that records every call; `deny` makes scheduling fail.
pub struct RecordingScheduler {
    storage: Arc<dyn KeyValueStore>,
    pub deny: AtomicBool,
    pub calls: Mutex<Vec<Call>>,
}

impl RecordingScheduler {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Arc<Self> {
        Arc::new(Self {
            storage,
            deny: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn cancels_for(&self, identifier: &str) -> Vec<Option<String>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Cancel(id, blob) if id == identifier => Some(blob),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl NotificationScheduler for RecordingScheduler {
    async fn request_permissions(&self) -> bool {
        !self.deny.load(Ordering::SeqCst)
    }

    async fn schedule_event_notification(
        &self,
        request: &NotificationRequest,
    ) -> Result<String, NotificationError> {
        if self.deny.load(Ordering::SeqCst) {
            return Err(NotificationError::PermissionDenied);
        }
        self.calls
            .lock()
            .unwrap()
            .push(Call::Schedule(request.identifier.clone()));
        Ok(request.identifier.clone())
    }

    async fn cancel_notification(&self, identifier: &str) {
        let blob = self
            .storage
            .get(cronograma_core::EVENTS_KEY)
            .await
            .ok()
            .flatten();
        self.calls
            .lock()
            .unwrap()
            .push(Call::Cancel(identifier.to_string(), blob));
    }

    async fn cancel_all_notifications(&self) {
        self.calls.lock().unwrap().push(Call::CancelAll);
    }

    async fn scheduled_notifications(&self) -> Vec<ScheduledNotification> {
        Vec::new()
    }
}

pub fn no_seed() -> StoreOptions {
    StoreOptions {
        seed_example_event: false,
        ..Default::default()
    }
}

pub async fn open_store(
    storage: Arc<dyn KeyValueStore>,
    options: StoreOptions,
) -> (CronogramaStore, Arc<RecordingScheduler>) {
    let scheduler = RecordingScheduler::new(Arc::clone(&storage));
    let store = CronogramaStore::open(storage, scheduler.clone(), options).await;
    (store, scheduler)
}
