use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Mood tag recorded in a diary entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mood {
    #[serde(rename = "muito_feliz")]
    VeryHappy,
    #[serde(rename = "feliz")]
    Happy,
    #[serde(rename = "neutro")]
    Neutral,
    #[serde(rename = "triste")]
    Sad,
    #[serde(rename = "muito_triste")]
    VerySad,
    #[serde(rename = "ansioso")]
    Anxious,
    #[serde(rename = "irritado")]
    Irritated,
}

impl Mood {
    pub const ALL: [Mood; 7] = [
        Mood::VeryHappy,
        Mood::Happy,
        Mood::Neutral,
        Mood::Sad,
        Mood::VerySad,
        Mood::Anxious,
        Mood::Irritated,
    ];

    /// Persisted tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Mood::VeryHappy => "muito_feliz",
            Mood::Happy => "feliz",
            Mood::Neutral => "neutro",
            Mood::Sad => "triste",
            Mood::VerySad => "muito_triste",
            Mood::Anxious => "ansioso",
            Mood::Irritated => "irritado",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mood::VeryHappy => "Muito feliz",
            Mood::Happy => "Feliz",
            Mood::Neutral => "Neutro",
            Mood::Sad => "Triste",
            Mood::VerySad => "Muito triste",
            Mood::Anxious => "Ansioso",
            Mood::Irritated => "Irritado",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Mood::VeryHappy => "😁",
            Mood::Happy => "😊",
            Mood::Neutral => "😐",
            Mood::Sad => "😔",
            Mood::VerySad => "😢",
            Mood::Anxious => "😰",
            Mood::Irritated => "😡",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mood::ALL
            .into_iter()
            .find(|mood| mood.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Mood::ALL.iter().map(|m| m.as_str()).collect();
                ValidationError::invalid("mood", format!("'{s}' is not one of {}", known.join(", ")))
            })
    }
}

/// One mood-diary entry. At most one per date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiaryEntry {
    pub id: String,
    pub date: NaiveDate,
    pub mood: Mood,
    #[serde(default)]
    pub note: String,
    pub created_at: DateTime<Utc>,
}

/// A diary entry before id and creation time are assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDiaryEntry {
    pub date: NaiveDate,
    pub mood: Mood,
    #[serde(default)]
    pub note: String,
}

/// Partial update for a [`DiaryEntry`]; `id` and `created_at` are not patchable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiaryPatch {
    pub date: Option<NaiveDate>,
    pub mood: Option<Mood>,
    pub note: Option<String>,
}

impl DiaryEntry {
    pub fn from_new(id: String, created_at: DateTime<Utc>, data: NewDiaryEntry) -> Self {
        Self {
            id,
            date: data.date,
            mood: data.mood,
            note: data.note,
            created_at,
        }
    }
}

impl DiaryPatch {
    pub fn apply(self, entry: &mut DiaryEntry) {
        if let Some(date) = self.date {
            entry.date = date;
        }
        if let Some(mood) = self.mood {
            entry.mood = mood;
        }
        if let Some(note) = self.note {
            entry.note = note;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mood_tags_roundtrip_through_from_str() {
        for mood in Mood::ALL {
            assert_eq!(mood.as_str().parse::<Mood>().unwrap(), mood);
            assert_eq!(
                serde_json::to_string(&mood).unwrap(),
                format!("\"{}\"", mood.as_str())
            );
        }
        assert!("euforico".parse::<Mood>().is_err());
    }

    #[test]
    fn entry_layout_uses_created_at() {
        let entry: DiaryEntry = serde_json::from_str(
            r#"{"id":"1","date":"2024-06-01","mood":"ansioso","note":"","createdAt":"2024-06-01T12:00:00.000Z"}"#,
        )
        .unwrap();
        assert_eq!(entry.mood, Mood::Anxious);
        assert_eq!(entry.mood.emoji(), "😰");

        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn patch_keeps_identity() {
        let created_at = Utc::now();
        let mut entry = DiaryEntry::from_new(
            "7".to_string(),
            created_at,
            NewDiaryEntry {
                date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                mood: Mood::Neutral,
                note: "ok".to_string(),
            },
        );
        DiaryPatch {
            mood: Some(Mood::Happy),
            ..Default::default()
        }
        .apply(&mut entry);

        assert_eq!(entry.id, "7");
        assert_eq!(entry.created_at, created_at);
        assert_eq!(entry.mood, Mood::Happy);
        assert_eq!(entry.note, "ok");
    }
}
