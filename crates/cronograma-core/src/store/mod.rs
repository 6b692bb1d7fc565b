//! The schedule/diary store.
//!
//! [`CronogramaStore`] exclusively owns the event and diary collections.
//! Construct it once at startup and hand clones (cheap, shared) to every
//! consumer. Plain add/update/delete return as soon as memory is updated
//! and persist in the background; the force deletes, refreshes and
//! [`CronogramaStore::flush`] are awaited.

mod collection;

use chrono::{Local, NaiveDate, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use self::collection::{Collection, Record};
use crate::error::{NotificationError, Result};
use crate::notify::{IdentifierScheme, NotificationRequest, NotificationScheduler};
use crate::schedule::{
    next_id, DiaryEntry, DiaryPatch, Event, EventPatch, NewDiaryEntry, NewEvent,
};
use crate::storage::{Config, KeyValueStore};

/// Storage key of the events blob.
pub const EVENTS_KEY: &str = "@cronograma_events";
/// Storage key of the diary blob.
pub const DIARY_KEY: &str = "@cronograma_diary_entries";

#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub seed_example_event: bool,
    pub verify_force_delete: bool,
    pub identifier_scheme: IdentifierScheme,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            seed_example_event: true,
            verify_force_delete: true,
            identifier_scheme: IdentifierScheme::default(),
        }
    }
}

impl From<&Config> for StoreOptions {
    fn from(config: &Config) -> Self {
        Self {
            seed_example_event: config.store.seed_example_event,
            verify_force_delete: config.store.verify_force_delete,
            identifier_scheme: config.notifications.identifier_scheme,
        }
    }
}

/// Result of (re)scheduling an event's alarm.
#[derive(Debug)]
pub enum AlarmOutcome {
    Scheduled(String),
    /// The event has no alarm; any previous one was cancelled.
    Disabled,
    /// No event with that id.
    Missing,
    /// Scheduling failed; the event itself is unaffected.
    Failed(NotificationError),
}

struct Inner {
    storage: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn NotificationScheduler>,
    options: StoreOptions,
    events: Collection<Event>,
    diary: Collection<DiaryEntry>,
    loading: AtomicBool,
}

#[derive(Clone)]
pub struct CronogramaStore {
    inner: Arc<Inner>,
}

impl CronogramaStore {
    /// Create an empty store in the loading state. Call
    /// [`initialize`](Self::initialize) to load persisted data.
    pub fn new(
        storage: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn NotificationScheduler>,
        options: StoreOptions,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                storage,
                notifier,
                options,
                events: Collection::new(EVENTS_KEY),
                diary: Collection::new(DIARY_KEY),
                loading: AtomicBool::new(true),
            }),
        }
    }

    /// [`new`](Self::new) followed by [`initialize`](Self::initialize).
    pub async fn open(
        storage: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn NotificationScheduler>,
        options: StoreOptions,
    ) -> Self {
        let store = Self::new(storage, notifier, options);
        store.initialize().await;
        store
    }

    /// Load both collections. Never fails: unreadable data resets to empty.
    pub async fn initialize(&self) {
        tokio::join!(self.load_events(), self.load_diary_entries());
        self.inner.loading.store(false, Ordering::Release);
        info!(
            events = self.inner.events.read(|items| items.len()),
            diary_entries = self.inner.diary.read(|items| items.len()),
            "store initialized"
        );
    }

    pub fn is_loading(&self) -> bool {
        self.inner.loading.load(Ordering::Acquire)
    }

    async fn load_events(&self) {
        let seed = self
            .inner
            .options
            .seed_example_event
            .then(|| Event::example(next_id(), Local::now().date_naive()));
        let seed_id = seed.as_ref().map(|event| event.id.clone());

        let seeded = self
            .inner
            .events
            .load(self.inner.storage.as_ref(), seed.into_iter().collect())
            .await;
        if let (true, Some(id)) = (seeded, seed_id) {
            self.arm_seed_alarm(&id).await;
        }
    }

    /// Schedule the example event's alarm. If that fails the event is kept
    /// with its alarm switched off.
    async fn arm_seed_alarm(&self, id: &str) {
        if let AlarmOutcome::Failed(e) = self.schedule_event_alarm(id, None).await {
            info!(event_id = id, error = %e, "example event seeded without alarm");
            self.update_event(
                id,
                EventPatch {
                    has_alarm: Some(false),
                    ..Default::default()
                },
            );
        }
    }

    async fn load_diary_entries(&self) {
        self.inner
            .diary
            .load(self.inner.storage.as_ref(), Vec::new())
            .await;
    }

    fn spawn_persist<T: Record>(&self, pick: fn(&Inner) -> &Collection<T>) {
        let inner = Arc::clone(&self.inner);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let collection = pick(&inner);
                    if let Err(e) = collection.persist(inner.storage.as_ref()).await {
                        error!(key = collection.key(), error = %e, "failed to persist {}s", T::KIND);
                    }
                });
            }
            Err(_) => debug!("no async runtime; write deferred until flush"),
        }
    }

    fn persist_events(&self) {
        self.spawn_persist(|inner| &inner.events);
    }

    fn persist_diary(&self) {
        self.spawn_persist(|inner| &inner.diary);
    }

    /// Await persistence of every in-memory change to both collections.
    pub async fn flush(&self) -> Result<()> {
        let storage = self.inner.storage.as_ref();
        let (events, diary) = tokio::join!(
            self.inner.events.persist(storage),
            self.inner.diary.persist(storage)
        );
        events?;
        diary?;
        Ok(())
    }

    // === Events ===

    pub fn events(&self) -> Vec<Event> {
        self.inner.events.snapshot()
    }

    pub fn event(&self, id: &str) -> Option<Event> {
        self.inner
            .events
            .read(|items| items.iter().find(|e| e.id == id).cloned())
    }

    /// Append a new event with a fresh id.
    pub fn add_event(&self, data: NewEvent) -> Event {
        let event = Event::from_new(next_id(), data);
        debug!(event_id = %event.id, date = %event.date, "adding event");
        self.inner.events.mutate(|items| {
            items.push(event.clone());
            true
        });
        self.persist_events();
        event
    }

    /// Merge `patch` over the event with `id`. Returns false (and changes
    /// nothing) if there is no such event.
    pub fn update_event(&self, id: &str, patch: EventPatch) -> bool {
        let found = self.inner.events.mutate(|items| {
            match items.iter_mut().find(|e| e.id == id) {
                Some(event) => {
                    patch.apply(event);
                    true
                }
                None => false,
            }
        });
        if found {
            debug!(event_id = id, "event updated");
            self.persist_events();
        } else {
            debug!(event_id = id, "update ignored, no such event");
        }
        found
    }

    /// Remove the event without touching its notification.
    pub fn delete_event(&self, id: &str) -> bool {
        let removed = self.inner.events.mutate(|items| {
            let before = items.len();
            items.retain(|e| e.id != id);
            items.len() != before
        });
        if removed {
            debug!(event_id = id, "event deleted");
            self.persist_events();
        }
        removed
    }

    /// Cancel the event's alarm (if any), remove it and wait until the
    /// removal is durable. Fails only if the write fails.
    pub async fn force_delete_event(&self, id: &str) -> Result<()> {
        info!(event_id = id, "force deleting event");
        if let Some(event) = self.event(id) {
            if event.has_alarm {
                self.cancel_event_alarm(&event).await;
            }
        }

        self.inner.events.mutate(|items| {
            let before = items.len();
            items.retain(|e| e.id != id);
            items.len() != before
        });

        let storage = self.inner.storage.as_ref();
        if let Err(e) = self.inner.events.persist(storage).await {
            error!(event_id = id, error = %e, "force delete could not be persisted");
            return Err(e.into());
        }

        if self.inner.options.verify_force_delete {
            self.inner.events.verify_absent(storage, id).await;
        }
        Ok(())
    }

    pub fn events_for_date(&self, date: NaiveDate) -> Vec<Event> {
        self.inner
            .events
            .read(|items| items.iter().filter(|e| e.date == date).cloned().collect())
    }

    /// Reload events from storage, keeping any not-yet-written local edits.
    pub async fn refresh_events(&self) {
        self.load_events().await;
    }

    /// Best-effort cancel of the alarm scheduled for `event`.
    pub async fn cancel_event_alarm(&self, event: &Event) {
        let identifier = self.inner.options.identifier_scheme.identifier_for(event);
        self.inner.notifier.cancel_notification(&identifier).await;
    }

    /// Bring the notification queue in line with the stored event.
    ///
    /// Cancels the alarm of `previous` (the event as it was before an edit,
    /// or the current event when `None`), then schedules a new one if the
    /// event has an alarm. Failures are soft: the event stays as stored.
    pub async fn schedule_event_alarm(&self, id: &str, previous: Option<&Event>) -> AlarmOutcome {
        let Some(event) = self.event(id) else {
            return AlarmOutcome::Missing;
        };

        let stale = previous.unwrap_or(&event);
        if stale.has_alarm {
            self.cancel_event_alarm(stale).await;
        }

        if !event.has_alarm {
            return AlarmOutcome::Disabled;
        }

        let request = NotificationRequest::for_event(&event, self.inner.options.identifier_scheme);
        match self.inner.notifier.schedule_event_notification(&request).await {
            Ok(identifier) => AlarmOutcome::Scheduled(identifier),
            Err(e) => {
                warn!(event_id = id, error = %e, "event kept without a scheduled alarm");
                AlarmOutcome::Failed(e)
            }
        }
    }

    // === Diary ===

    pub fn diary_entries(&self) -> Vec<DiaryEntry> {
        self.inner.diary.snapshot()
    }

    /// Insert an entry, replacing any existing entry for the same date.
    pub fn add_diary_entry(&self, data: NewDiaryEntry) -> DiaryEntry {
        let entry = DiaryEntry::from_new(next_id(), Utc::now(), data);
        debug!(entry_id = %entry.id, date = %entry.date, "adding diary entry");
        self.inner.diary.mutate(|items| {
            items.retain(|e| e.date != entry.date);
            items.push(entry.clone());
            true
        });
        self.persist_diary();
        entry
    }

    pub fn diary_entry_for_date(&self, date: NaiveDate) -> Option<DiaryEntry> {
        self.inner
            .diary
            .read(|items| items.iter().find(|e| e.date == date).cloned())
    }

    pub fn update_diary_entry(&self, id: &str, patch: DiaryPatch) -> bool {
        let found = self.inner.diary.mutate(|items| {
            match items.iter_mut().find(|e| e.id == id) {
                Some(entry) => {
                    patch.apply(entry);
                    true
                }
                None => false,
            }
        });
        if found {
            debug!(entry_id = id, "diary entry updated");
            self.persist_diary();
        }
        found
    }

    pub fn delete_diary_entry(&self, id: &str) -> bool {
        let removed = self.inner.diary.mutate(|items| {
            let before = items.len();
            items.retain(|e| e.id != id);
            items.len() != before
        });
        if removed {
            debug!(entry_id = id, "diary entry deleted");
            self.persist_diary();
        }
        removed
    }

    /// Remove the entry and wait until the removal is durable.
    pub async fn force_delete_diary_entry(&self, id: &str) -> Result<()> {
        info!(entry_id = id, "force deleting diary entry");
        self.inner.diary.mutate(|items| {
            let before = items.len();
            items.retain(|e| e.id != id);
            items.len() != before
        });

        let storage = self.inner.storage.as_ref();
        if let Err(e) = self.inner.diary.persist(storage).await {
            error!(entry_id = id, error = %e, "force delete could not be persisted");
            return Err(e.into());
        }

        if self.inner.options.verify_force_delete {
            self.inner.diary.verify_absent(storage, id).await;
        }
        Ok(())
    }

    pub async fn refresh_diary_entries(&self) {
        self.load_diary_entries().await;
    }
}
