use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A calendar event, optionally carrying an alarm.
///
/// JSON field names are camelCase to match the persisted
/// `@cronograma_events` layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub note: String,
    pub date: NaiveDate,
    /// Display time, `HH:mm`.
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub has_alarm: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_alarm: Option<bool>,
}

/// An event before it has been assigned an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: String,
    #[serde(default)]
    pub note: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub has_alarm: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_alarm: Option<bool>,
}

/// Partial update merged over a stored [`Event`]. The id never changes.
///
/// `alarm_time` and `repeat_alarm` are doubly optional: `Some(None)` clears
/// the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub note: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub has_alarm: Option<bool>,
    pub alarm_time: Option<Option<String>>,
    pub repeat_alarm: Option<Option<bool>>,
}

impl Event {
    pub fn from_new(id: String, data: NewEvent) -> Self {
        Self {
            id,
            title: data.title,
            note: data.note,
            date: data.date,
            time: data.time,
            has_alarm: data.has_alarm,
            alarm_time: data.alarm_time,
            repeat_alarm: data.repeat_alarm,
        }
    }

    /// Wall-clock time the alarm fires: `alarm_time` when set, else `time`.
    pub fn alarm_clock(&self) -> &str {
        self.alarm_time.as_deref().unwrap_or(&self.time)
    }

    /// The first-run example event.
    pub fn example(id: String, date: NaiveDate) -> Self {
        Self {
            id,
            title: "Fonoaudiologo".to_string(),
            note: "com a doutora patricia".to_string(),
            date,
            time: "08:00".to_string(),
            has_alarm: true,
            alarm_time: Some("08:00".to_string()),
            repeat_alarm: Some(false),
        }
    }
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge this patch over `event`.
    pub fn apply(self, event: &mut Event) {
        if let Some(title) = self.title {
            event.title = title;
        }
        if let Some(note) = self.note {
            event.note = note;
        }
        if let Some(date) = self.date {
            event.date = date;
        }
        if let Some(time) = self.time {
            event.time = time;
        }
        if let Some(has_alarm) = self.has_alarm {
            event.has_alarm = has_alarm;
        }
        if let Some(alarm_time) = self.alarm_time {
            event.alarm_time = alarm_time;
        }
        if let Some(repeat_alarm) = self.repeat_alarm {
            event.repeat_alarm = repeat_alarm;
        }
    }
}
