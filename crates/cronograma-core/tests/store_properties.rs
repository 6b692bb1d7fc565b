//! Property tests for diary uniqueness and date filtering.

mod common;

use chrono::NaiveDate;
use common::{no_seed, open_store};
use cronograma_core::{KeyValueStore, MemoryStore, Mood, NewDiaryEntry, NewEvent};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn day(offset: u8) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap() + chrono::Days::new(offset as u64)
}

fn mood_strategy() -> impl Strategy<Value = Mood> {
    prop::sample::select(Mood::ALL.to_vec())
}

#[derive(Debug, Clone)]
enum EventOp {
    Add(u8),
    Move(usize, u8),
    Delete(usize),
}

fn event_op() -> impl Strategy<Value = EventOp> {
    prop_oneof![
        3 => (0u8..6).prop_map(EventOp::Add),
        1 => (any::<usize>(), 0u8..6).prop_map(|(i, d)| EventOp::Move(i, d)),
        1 => any::<usize>().prop_map(EventOp::Delete),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn at_most_one_diary_entry_per_date(
        adds in prop::collection::vec((0u8..5, mood_strategy()), 0..20),
        deletes in prop::collection::vec(any::<usize>(), 0..4),
    ) {
        runtime().block_on(async {
            let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
            let (store, _) = open_store(storage, no_seed()).await;

            for (offset, mood) in &adds {
                store.add_diary_entry(NewDiaryEntry {
                    date: day(*offset),
                    mood: *mood,
                    note: String::new(),
                });
            }
            for pick in &deletes {
                let entries = store.diary_entries();
                if !entries.is_empty() {
                    store.delete_diary_entry(&entries[pick % entries.len()].id);
                }
            }

            let entries = store.diary_entries();
            let dates: HashSet<_> = entries.iter().map(|e| e.date).collect();
            prop_assert_eq!(dates.len(), entries.len());

            // The surviving entry for a date carries the last mood written to it.
            for entry in &entries {
                let last = adds
                    .iter()
                    .rev()
                    .find(|(offset, _)| day(*offset) == entry.date)
                    .map(|(_, mood)| *mood);
                prop_assert_eq!(Some(entry.mood), last);
            }
            Ok(())
        })?;
    }

    #[test]
    fn date_filter_matches_collection(
        ops in prop::collection::vec(event_op(), 0..30),
        probe in 0u8..6,
    ) {
        runtime().block_on(async {
            let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
            let (store, _) = open_store(storage, no_seed()).await;

            for op in &ops {
                let events = store.events();
                match op {
                    EventOp::Add(offset) => {
                        store.add_event(NewEvent {
                            title: format!("e{offset}"),
                            note: String::new(),
                            date: day(*offset),
                            time: "09:00".to_string(),
                            has_alarm: false,
                            alarm_time: None,
                            repeat_alarm: None,
                        });
                    }
                    EventOp::Move(pick, offset) if !events.is_empty() => {
                        let id = &events[pick % events.len()].id;
                        store.update_event(id, cronograma_core::EventPatch {
                            date: Some(day(*offset)),
                            ..Default::default()
                        });
                    }
                    EventOp::Delete(pick) if !events.is_empty() => {
                        store.delete_event(&events[pick % events.len()].id);
                    }
                    _ => {}
                }
            }

            let target = day(probe);
            let filtered = store.events_for_date(target);
            let expected: Vec<_> = store
                .events()
                .into_iter()
                .filter(|e| e.date == target)
                .collect();
            prop_assert_eq!(filtered, expected);
            Ok(())
        })?;
    }
}
