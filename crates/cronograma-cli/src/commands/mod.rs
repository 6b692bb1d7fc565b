pub mod config;
pub mod diary;
pub mod event;
pub mod notify;

use chrono::{Local, NaiveDate};
use cronograma_core::notify::ScheduledNotification;
use cronograma_core::{
    Config, CoreError, CronogramaStore, Database, KeyValueStore, NotificationService,
    QueueBackend, StoreOptions,
};
use std::sync::Arc;
use tracing::debug;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Everything a data command needs: loaded config, storage, notifier and
/// an initialized store over them.
pub struct Session {
    pub store: CronogramaStore,
    pub notifier: Arc<NotificationService<QueueBackend>>,
}

impl Session {
    pub async fn open() -> Result<Self, CoreError> {
        let config = Config::load()?;
        debug!(database = %config.storage.database, "opening store");
        let storage: Arc<dyn KeyValueStore> =
            Arc::new(Database::open(&config.storage.database)?);
        let backend = QueueBackend::new(Arc::clone(&storage), config.notifications.enabled);
        let notifier = Arc::new(NotificationService::new(backend, &config.notifications));
        let store =
            CronogramaStore::open(storage, notifier.clone(), StoreOptions::from(&config)).await;
        Ok(Self { store, notifier })
    }

    /// Dequeue and return every alarm due now.
    pub async fn fire_due(&self) -> Result<Vec<ScheduledNotification>, CoreError> {
        let due = self
            .notifier
            .backend()
            .take_due(Local::now().naive_local())
            .await?;
        Ok(due)
    }

    /// Wait for every pending write to land.
    pub async fn close(self) -> CmdResult {
        self.store.flush().await?;
        Ok(())
    }
}

/// Accepts `YYYY-MM-DD` or `today`.
pub fn parse_date(input: &str) -> Result<NaiveDate, String> {
    if input.eq_ignore_ascii_case("today") {
        return Ok(Local::now().date_naive());
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{input}' (expected YYYY-MM-DD): {e}"))
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
