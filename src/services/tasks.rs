//! Task list kept in `tasks.json`.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::store::{load_json, now_timestamp, save_json, TIMESTAMP_FORMAT};
use crate::classifier::{spoken_number, tokenize};

pub const DEFAULT_CATEGORY: &str = "general";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Finds "low" / "medium" / "high" anywhere in the text.
    pub fn parse(text: &str) -> Option<Self> {
        tokenize(text).iter().find_map(|t| match t.as_str() {
            "low" => Some(Self::Low),
            "medium" | "normal" => Some(Self::Medium),
            "high" | "urgent" => Some(Self::High),
            _ => None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u32,
    pub title: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<String>,
    pub category: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl Task {
    pub fn due(&self) -> Option<NaiveDateTime> {
        self.due_date
            .as_deref()
            .and_then(|d| NaiveDateTime::parse_from_str(d, TIMESTAMP_FORMAT).ok())
    }

    /// One spoken line per task.
    pub fn describe(&self) -> String {
        let mut line = format!("Task {}: {}, {} priority", self.id, self.title, self.priority);
        if let Some(due) = self.due() {
            line.push_str(&format!(", due {}", due.format("%B %-d at %-I:%M %p")));
        }
        if self.completed {
            line.push_str(", completed");
        }
        line
    }
}

/// How the user pointed at a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskRef {
    Id(u32),
    Title(String),
}

impl TaskRef {
    /// A bare number (digits or word) is an id, anything else a title fragment.
    pub fn parse(text: &str) -> Option<Self> {
        let tokens = tokenize(text);
        let tokens: Vec<&str> = tokens
            .iter()
            .map(String::as_str)
            .filter(|t| !matches!(*t, "task" | "number" | "id"))
            .collect();
        match tokens.as_slice() {
            [] => None,
            [single] => Some(spoken_number(single).map_or_else(
                || Self::Title(single.to_string()),
                Self::Id,
            )),
            many => Some(Self::Title(many.join(" "))),
        }
    }

    fn matches(&self, task: &Task) -> bool {
        match self {
            Self::Id(id) => task.id == *id,
            Self::Title(fragment) => task.title.to_lowercase().contains(&fragment.to_lowercase()),
        }
    }
}

fn end_of_day(date: NaiveDate) -> Option<NaiveDateTime> {
    date.and_hms_opt(23, 59, 59)
}

/// Parse a spoken due date: "today", "tomorrow", "in 3 days", "next week",
/// "2026-05-01" (end of that day) or a full "2026-05-01 09:00:00".
pub fn parse_due_date(text: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let text = text.trim().to_lowercase();
    if let Ok(full) = NaiveDateTime::parse_from_str(&text, TIMESTAMP_FORMAT) {
        return Some(full);
    }
    if let Ok(date) = NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
        return end_of_day(date);
    }

    let today = now.date();
    let tokens = tokenize(&text);
    let words: Vec<&str> = tokens.iter().map(String::as_str).collect();
    let offset_days = match words.as_slice() {
        [.., "today"] | ["today", ..] => 0,
        [.., "tomorrow"] | ["tomorrow", ..] => 1,
        ["next", "week"] => 7,
        ["in", n, "day" | "days"] => i64::from(spoken_number(n)?),
        ["in", n, "week" | "weeks"] => 7 * i64::from(spoken_number(n)?),
        _ => return None,
    };
    end_of_day(today + Duration::days(offset_days))
}

/// Pending tasks due between `now` and `now + window`.
pub fn due_between(tasks: &[Task], now: NaiveDateTime, window: Duration) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|t| !t.completed)
        .filter(|t| t.due().is_some_and(|d| d >= now && d - now <= window))
        .collect()
}

pub struct TaskStore {
    path: PathBuf,
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn open(data_dir: &Path) -> Self {
        let path = tasks_path(data_dir);
        let mut tasks: Vec<Task> = load_json(&path);
        tasks.sort_by_key(|t| t.id);
        Self { path, tasks }
    }

    fn commit(&mut self, next: Vec<Task>) -> anyhow::Result<()> {
        save_json(&self.path, &next)?;
        self.tasks = next;
        Ok(())
    }

    pub fn add(
        &mut self,
        title: &str,
        priority: Priority,
        due: Option<NaiveDateTime>,
        category: Option<&str>,
    ) -> anyhow::Result<Task> {
        let title = title.trim();
        if title.is_empty() {
            anyhow::bail!("Task title cannot be empty");
        }
        let category = category
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
        let task = Task {
            id: self.tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1,
            title: title.to_string(),
            priority,
            due_date: due.map(|d| d.format(TIMESTAMP_FORMAT).to_string()),
            category,
            completed: false,
            created_at: now_timestamp(),
            completed_at: None,
        };
        let mut next = self.tasks.clone();
        next.push(task.clone());
        self.commit(next)?;
        info!(id = task.id, priority = %priority, "Task added");
        Ok(task)
    }

    pub fn matching(&self, target: &TaskRef) -> Vec<&Task> {
        self.tasks.iter().filter(|t| target.matches(t)).collect()
    }

    /// Remove every task the reference matches. Returns how many went.
    pub fn remove(&mut self, target: &TaskRef) -> anyhow::Result<usize> {
        let next: Vec<Task> = self
            .tasks
            .iter()
            .filter(|t| !target.matches(t))
            .cloned()
            .collect();
        let removed = self.tasks.len() - next.len();
        if removed > 0 {
            self.commit(next)?;
        }
        Ok(removed)
    }

    /// Mark the first matching pending task done.
    pub fn complete(&mut self, target: &TaskRef) -> anyhow::Result<Option<Task>> {
        let mut next = self.tasks.clone();
        let Some(task) = next.iter_mut().find(|t| !t.completed && target.matches(t)) else {
            return Ok(None);
        };
        task.completed = true;
        task.completed_at = Some(now_timestamp());
        let done = task.clone();
        self.commit(next)?;
        Ok(Some(done))
    }

    pub fn list(&self, include_completed: bool) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| include_completed || !t.completed)
            .collect()
    }

    pub fn by_priority(&self, priority: Priority) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| !t.completed && t.priority == priority)
            .collect()
    }

    pub fn by_category(&self, category: &str) -> Vec<&Task> {
        let category = category.trim().to_lowercase();
        self.tasks
            .iter()
            .filter(|t| !t.completed && t.category == category)
            .collect()
    }

    /// Pending tasks due within the next 24 hours.
    pub fn due_soon(&self, now: NaiveDateTime) -> Vec<&Task> {
        due_between(&self.tasks, now, Duration::hours(24))
    }

    pub fn overdue(&self, now: NaiveDateTime) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| !t.completed && t.due().is_some_and(|d| d < now))
            .collect()
    }
}

pub fn tasks_path(data_dir: &Path) -> PathBuf {
    data_dir.join("tasks.json")
}
