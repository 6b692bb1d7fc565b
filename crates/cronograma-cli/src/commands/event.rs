use clap::Subcommand;
use cronograma_core::schedule::parse_clock_time;
use cronograma_core::{AlarmOutcome, Event, EventPatch, NewEvent};

use super::{parse_date, print_json, CmdResult, Session};
use chrono::NaiveDate;

fn parse_time(input: &str) -> Result<String, String> {
    parse_clock_time(input)
        .map(|_| input.trim().to_string())
        .map_err(|e| e.to_string())
}

#[derive(Subcommand)]
pub enum EventAction {
    /// Add an event
    Add {
        /// Event title
        title: String,
        /// Date (YYYY-MM-DD or "today")
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,
        /// Time of day (HH:mm)
        #[arg(long, value_parser = parse_time)]
        time: String,
        #[arg(long, default_value = "")]
        note: String,
        /// Schedule an alarm for this event
        #[arg(long)]
        alarm: bool,
        /// Alarm time when it differs from the event time
        #[arg(long, value_parser = parse_time, requires = "alarm")]
        alarm_time: Option<String>,
        /// Repeat the alarm daily
        #[arg(long, requires = "alarm")]
        repeat: bool,
    },
    /// List events
    List {
        /// Only events on this date
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit an event
    Edit {
        /// Event ID
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        note: Option<String>,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        #[arg(long, value_parser = parse_time)]
        time: Option<String>,
        /// Turn the alarm on or off
        #[arg(long)]
        alarm: Option<bool>,
        #[arg(long, value_parser = parse_time)]
        alarm_time: Option<String>,
        /// Repeat the alarm daily
        #[arg(long)]
        repeat: Option<bool>,
    },
    /// Delete an event
    Delete {
        /// Event ID
        id: String,
        /// Also cancel its alarm and wait until the deletion is saved
        #[arg(long)]
        force: bool,
    },
}

fn report_alarm(outcome: AlarmOutcome) {
    match outcome {
        AlarmOutcome::Scheduled(identifier) => println!("alarm scheduled ({identifier})"),
        AlarmOutcome::Failed(e) => eprintln!("warning: event saved without alarm: {e}"),
        AlarmOutcome::Disabled | AlarmOutcome::Missing => {}
    }
}

fn print_event(event: &Event) {
    let alarm = if event.has_alarm {
        let repeat = if event.repeat_alarm.unwrap_or(false) {
            ", daily"
        } else {
            ""
        };
        format!("  [alarm {}{repeat}]", event.alarm_clock())
    } else {
        String::new()
    };
    println!(
        "{}  {} {}  {}{alarm}",
        event.id, event.date, event.time, event.title
    );
    if !event.note.is_empty() {
        println!("    {}", event.note);
    }
}

pub async fn run(action: EventAction) -> CmdResult {
    let session = Session::open().await?;
    let store = &session.store;

    match action {
        EventAction::Add {
            title,
            date,
            time,
            note,
            alarm,
            alarm_time,
            repeat,
        } => {
            let event = store.add_event(NewEvent {
                title,
                note,
                date,
                time,
                has_alarm: alarm,
                alarm_time,
                repeat_alarm: alarm.then_some(repeat),
            });
            println!("event added: {}", event.id);
            if event.has_alarm {
                report_alarm(store.schedule_event_alarm(&event.id, None).await);
            }
        }
        EventAction::List { date, json } => {
            let mut events = match date {
                Some(date) => store.events_for_date(date),
                None => store.events(),
            };
            events.sort_by(|a, b| (a.date, &a.time).cmp(&(b.date, &b.time)));
            if json {
                print_json(&events)?;
            } else if events.is_empty() {
                println!("no events");
            } else {
                events.iter().for_each(print_event);
            }
        }
        EventAction::Edit {
            id,
            title,
            note,
            date,
            time,
            alarm,
            alarm_time,
            repeat,
        } => {
            let previous = store
                .event(&id)
                .ok_or_else(|| format!("event not found: {id}"))?;
            let patch = EventPatch {
                title,
                note,
                date,
                time,
                has_alarm: alarm,
                alarm_time: alarm_time.map(Some),
                repeat_alarm: repeat.map(Some),
            };
            if patch.is_empty() {
                return Err("nothing to change".into());
            }
            store.update_event(&id, patch);
            println!("event updated: {id}");
            report_alarm(store.schedule_event_alarm(&id, Some(&previous)).await);
        }
        EventAction::Delete { id, force } => {
            if force {
                if store.event(&id).is_none() {
                    return Err(format!("event not found: {id}").into());
                }
                store.force_delete_event(&id).await?;
            } else if !store.delete_event(&id) {
                return Err(format!("event not found: {id}").into());
            }
            println!("event deleted: {id}");
        }
    }

    session.close().await
}
