use chrono::NaiveDate;
use clap::Subcommand;
use cronograma_core::{DiaryEntry, DiaryPatch, Mood, NewDiaryEntry};

use super::{parse_date, print_json, CmdResult, Session};

#[derive(Subcommand)]
pub enum DiaryAction {
    /// Record the mood for a day, replacing any entry for that date
    Add {
        /// Mood: muito_feliz, feliz, neutro, triste, muito_triste, ansioso, irritado
        mood: Mood,
        #[arg(long, value_parser = parse_date, default_value = "today")]
        date: NaiveDate,
        #[arg(long, default_value = "")]
        note: String,
    },
    /// Show the entry for a date
    Show {
        #[arg(value_parser = parse_date, default_value = "today")]
        date: NaiveDate,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all entries, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit an entry
    Edit {
        /// Entry ID
        id: String,
        #[arg(long)]
        mood: Option<Mood>,
        #[arg(long)]
        note: Option<String>,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Delete an entry
    Delete {
        /// Entry ID
        id: String,
        /// Wait until the deletion is saved
        #[arg(long)]
        force: bool,
    },
}

fn print_entry(entry: &DiaryEntry) {
    println!(
        "{}  {} {} {}",
        entry.id,
        entry.date,
        entry.mood.emoji(),
        entry.mood.label()
    );
    if !entry.note.is_empty() {
        println!("    {}", entry.note);
    }
}

pub async fn run(action: DiaryAction) -> CmdResult {
    let session = Session::open().await?;
    let store = &session.store;

    match action {
        DiaryAction::Add { mood, date, note } => {
            let entry = store.add_diary_entry(NewDiaryEntry { date, mood, note });
            println!("diary entry saved: {}", entry.id);
        }
        DiaryAction::Show { date, json } => match store.diary_entry_for_date(date) {
            Some(entry) if json => print_json(&entry)?,
            Some(entry) => print_entry(&entry),
            None => println!("no entry for {date}"),
        },
        DiaryAction::List { json } => {
            let mut entries = store.diary_entries();
            entries.sort_by(|a, b| b.date.cmp(&a.date));
            if json {
                print_json(&entries)?;
            } else if entries.is_empty() {
                println!("no diary entries");
            } else {
                entries.iter().for_each(print_entry);
            }
        }
        DiaryAction::Edit {
            id,
            mood,
            note,
            date,
        } => {
            if let Some(date) = date {
                if let Some(other) = store.diary_entry_for_date(date).filter(|e| e.id != id) {
                    return Err(format!("{date} already has entry {}", other.id).into());
                }
            }
            let patch = DiaryPatch { date, mood, note };
            if patch == DiaryPatch::default() {
                return Err("nothing to change".into());
            }
            if !store.update_diary_entry(&id, patch) {
                return Err(format!("diary entry not found: {id}").into());
            }
            println!("diary entry updated: {id}");
        }
        DiaryAction::Delete { id, force } => {
            let exists = store.diary_entries().iter().any(|e| e.id == id);
            if !exists {
                return Err(format!("diary entry not found: {id}").into());
            }
            if force {
                store.force_delete_diary_entry(&id).await?;
            } else {
                store.delete_diary_entry(&id);
            }
            println!("diary entry deleted: {id}");
        }
    }

    session.close().await
}
