//! Background reminders for tasks that are about to fall due.
//!
//! The worker re-reads `tasks.json` on every tick and never writes it; the
//! dispatch loop stays the only owner of the task store. Each task is
//! announced once per run.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::config::ReminderConfig;
use crate::services::store::load_json;
use crate::services::tasks::{due_between, tasks_path, Task};
use crate::speech::SpeechHandle;

const MIN_INTERVAL_SECS: u64 = 10;

fn reminder_window() -> chrono::Duration {
    chrono::Duration::hours(1)
}

pub struct ReminderChecker {
    path: PathBuf,
    announced: HashSet<u32>,
}

impl ReminderChecker {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: tasks_path(data_dir),
            announced: HashSet::new(),
        }
    }

    /// Reminder lines for pending tasks due within the hour that have not
    /// been announced yet.
    pub fn check(&mut self, now: NaiveDateTime) -> Vec<String> {
        let tasks: Vec<Task> = load_json(&self.path);
        due_between(&tasks, now, reminder_window())
            .into_iter()
            .filter(|t| self.announced.insert(t.id))
            .map(|t| {
                let at = t
                    .due()
                    .map(|d| d.format("%-I:%M %p").to_string())
                    .unwrap_or_default();
                format!("Reminder: {} is due at {}.", t.title, at)
            })
            .collect()
    }
}

/// Start the reminder loop, or `None` when reminders are turned off.
pub fn spawn(
    data_dir: &Path,
    config: &ReminderConfig,
    speech: SpeechHandle,
) -> Option<JoinHandle<()>> {
    if !config.enabled {
        info!("Task reminders disabled");
        return None;
    }
    let period = Duration::from_secs(config.interval_secs.max(MIN_INTERVAL_SECS));
    let mut checker = ReminderChecker::new(data_dir);
    info!(interval_secs = period.as_secs(), "Task reminders enabled");

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let lines = checker.check(chrono::Local::now().naive_local());
            debug!(count = lines.len(), "Reminder check");
            for line in lines {
                speech.announce(line);
            }
        }
    }))
}
