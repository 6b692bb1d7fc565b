//! # Cronograma Core Library
//!
//! Device-local schedule and mood-diary state for the Cronograma app,
//! with local notification scheduling for event alarms.
//!
//! ## Architecture
//!
//! - **Storage**: string-keyed blob storage behind [`KeyValueStore`]
//!   (SQLite [`Database`] or volatile [`MemoryStore`]) and TOML [`Config`]
//! - **Schedule**: [`Event`] and [`DiaryEntry`] records
//! - **Notify**: the [`NotificationScheduler`] contract and its
//!   [`NotificationService`] implementation
//! - **Store**: [`CronogramaStore`], the single owner of both collections,
//!   mirroring them to storage with coalesced write-through

pub mod error;
pub mod notify;
pub mod schedule;
pub mod storage;
pub mod store;

pub use error::{ConfigError, CoreError, NotificationError, StorageError, ValidationError};
pub use notify::{
    IdentifierScheme, NotificationRequest, NotificationScheduler, NotificationService,
    QueueBackend,
};
pub use schedule::{DiaryEntry, DiaryPatch, Event, EventPatch, Mood, NewDiaryEntry, NewEvent};
pub use storage::{Config, Database, KeyValueStore, MemoryStore};
pub use store::{AlarmOutcome, CronogramaStore, StoreOptions, DIARY_KEY, EVENTS_KEY};
