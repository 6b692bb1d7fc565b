use clap::Subcommand;
use cronograma_core::notify::ScheduledNotification;
use cronograma_core::NotificationScheduler;

use super::{print_json, CmdResult, Session};

#[derive(Subcommand)]
pub enum NotifyAction {
    /// List queued alarms
    Pending {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print and dequeue every alarm that is due now
    Fire {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Cancel every queued alarm
    Clear,
}

fn print_notification(n: &ScheduledNotification) {
    let repeat = if n.repeat_daily { " (daily)" } else { "" };
    println!("{}  {}{repeat}", n.fire_at.format("%Y-%m-%d %H:%M"), n.identifier);
    println!("    {}: {}", n.title, n.body);
}

pub async fn run(action: NotifyAction) -> CmdResult {
    let session = Session::open().await?;
    let notifier = &session.notifier;

    match action {
        NotifyAction::Pending { json } => {
            let pending = notifier.scheduled_notifications().await;
            if json {
                print_json(&pending)?;
            } else if pending.is_empty() {
                println!("no pending alarms");
            } else {
                pending.iter().for_each(print_notification);
            }
        }
        NotifyAction::Fire { json } => {
            let due = session.fire_due().await?;
            if json {
                print_json(&due)?;
            } else if due.is_empty() {
                println!("nothing due");
            } else {
                due.iter().for_each(print_notification);
            }
        }
        NotifyAction::Clear => {
            notifier.cancel_all_notifications().await;
            println!("all alarms cancelled");
        }
    }

    session.close().await
}
