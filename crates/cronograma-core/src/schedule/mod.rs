//! Schedule types: calendar events and mood-diary entries.
//!
//! Both are keyed by an opaque string id and partitioned by a calendar
//! date with no time component.

mod diary;
mod event;

pub use diary::{DiaryEntry, DiaryPatch, Mood, NewDiaryEntry};
pub use event::{Event, EventPatch, NewEvent};

use chrono::NaiveTime;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::error::ValidationError;

static LAST_ID: AtomicI64 = AtomicI64::new(0);

/// Generate a record id: milliseconds since the epoch, strictly increasing
/// within the process.
pub fn next_id() -> String {
    let now = chrono::Utc::now().timestamp_millis();
    let mut last = LAST_ID.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_ID.compare_exchange_weak(last, candidate, Ordering::SeqCst, Ordering::Relaxed)
        {
            Ok(_) => return candidate.to_string(),
            Err(actual) => last = actual,
        }
    }
}

/// Parse a wall-clock string: `HH:mm`, `H:mm` or `hh:mm AM/PM`.
pub fn parse_clock_time(input: &str) -> Result<NaiveTime, ValidationError> {
    let invalid = || ValidationError::invalid("time", format!("'{input}' is not HH:mm or hh:mm AM/PM"));

    let upper = input.trim().to_ascii_uppercase();
    let (clock, pm) = if let Some(rest) = upper.strip_suffix("AM") {
        (rest.trim_end(), Some(false))
    } else if let Some(rest) = upper.strip_suffix("PM") {
        (rest.trim_end(), Some(true))
    } else {
        (upper.as_str(), None)
    };

    let (hours, minutes) = clock.split_once(':').ok_or_else(invalid)?;
    if minutes.len() != 2 || hours.is_empty() || hours.len() > 2 {
        return Err(invalid());
    }
    let hour: u32 = hours.parse().map_err(|_| invalid())?;
    let minute: u32 = minutes.parse().map_err(|_| invalid())?;

    let hour = match pm {
        None => hour,
        Some(_) if hour == 0 || hour > 12 => return Err(invalid()),
        Some(false) => hour % 12,
        Some(true) => hour % 12 + 12,
    };

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_increasing() {
        let ids: Vec<i64> = (0..500).map(|_| next_id().parse().unwrap()).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn parses_24h_clock() {
        assert_eq!(
            parse_clock_time("08:00").unwrap(),
            NaiveTime::from_hms_opt(8, 0, 0).unwrap()
        );
        assert_eq!(
            parse_clock_time("8:05").unwrap(),
            NaiveTime::from_hms_opt(8, 5, 0).unwrap()
        );
        assert_eq!(
            parse_clock_time(" 23:59 ").unwrap(),
            NaiveTime::from_hms_opt(23, 59, 0).unwrap()
        );
    }

    #[test]
    fn parses_meridiem_clock() {
        assert_eq!(
            parse_clock_time("12:30 AM").unwrap(),
            NaiveTime::from_hms_opt(0, 30, 0).unwrap()
        );
        assert_eq!(
            parse_clock_time("12:15 pm").unwrap(),
            NaiveTime::from_hms_opt(12, 15, 0).unwrap()
        );
        assert_eq!(
            parse_clock_time("07:45PM").unwrap(),
            NaiveTime::from_hms_opt(19, 45, 0).unwrap()
        );
    }

    #[test]
    fn rejects_malformed_clock() {
        for bad in ["", "8", "24:00", "08:60", "8:5", "13:00 PM", "00:10 AM", "ab:cd"] {
            assert!(parse_clock_time(bad).is_err(), "accepted {bad:?}");
        }
    }
}
