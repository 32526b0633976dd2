//! Per-command performance tracking and user feedback.
//!
//! Saved to `<data_dir>/evaluation.json` every ten commands and at exit.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::store::{now_timestamp, save_json};
use crate::classifier::tokenize;

const SAVE_EVERY: u32 = 10;
const TOP_ERRORS: usize = 5;

const CATEGORIES: &[(&str, &[&str])] = &[
    ("information", &["what", "who", "when", "where", "why", "how", "tell me", "explain"]),
    ("action", &["open", "close", "send", "create", "delete", "play", "stop", "search"]),
    ("system", &["volume", "brightness", "shutdown", "restart", "sleep"]),
    ("communication", &["email", "message", "call", "remind"]),
    ("entertainment", &["music", "video", "joke", "story"]),
];

/// Coarse command category from keywords. First listed category wins.
pub fn categorize(command: &str) -> &'static str {
    let padded = format!(" {} ", tokenize(command).join(" "));
    CATEGORIES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| padded.contains(&format!(" {} ", k))))
        .map(|(name, _)| *name)
        .unwrap_or("other")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub timestamp: String,
    pub feedback: String,
    pub score: u8,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metrics {
    pub total_commands: u32,
    pub successful_commands: u32,
    pub failed_commands: u32,
    /// Seconds per command.
    pub response_times: Vec<f64>,
    pub command_types: BTreeMap<String, u32>,
    pub error_types: BTreeMap<String, u32>,
    pub user_satisfaction: Vec<Feedback>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    pub uptime_hours: f64,
    pub success_rate: f64,
    pub average_response_time: f64,
    pub total_commands: u32,
    pub command_breakdown: BTreeMap<String, u32>,
    pub common_errors: Vec<(String, u32)>,
    pub user_satisfaction_average: f64,
}

impl PerformanceReport {
    pub fn describe(&self) -> String {
        if self.total_commands == 0 {
            return "I haven't handled any commands yet.".to_string();
        }
        let mut line = format!(
            "I've handled {} commands with a {:.0}% success rate and an average response time of {:.1} seconds.",
            self.total_commands, self.success_rate, self.average_response_time
        );
        if self.user_satisfaction_average > 0.0 {
            line.push_str(&format!(
                " Your average satisfaction score is {:.1} out of 10.",
                self.user_satisfaction_average
            ));
        }
        line
    }
}

#[derive(Serialize)]
struct EvaluationFile<'a> {
    timestamp: String,
    metrics: &'a Metrics,
    performance_report: PerformanceReport,
}

pub struct AgentEvaluator {
    path: PathBuf,
    metrics: Metrics,
    started: Instant,
}

impl AgentEvaluator {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("evaluation.json"),
            metrics: Metrics::default(),
            started: Instant::now(),
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn log_command(
        &mut self,
        command: &str,
        success: bool,
        elapsed: Duration,
        error: Option<&str>,
    ) {
        let m = &mut self.metrics;
        m.total_commands += 1;
        if success {
            m.successful_commands += 1;
        } else {
            m.failed_commands += 1;
            if let Some(error) = error {
                *m.error_types.entry(error.to_string()).or_default() += 1;
            }
        }
        m.response_times.push(elapsed.as_secs_f64());
        *m.command_types.entry(categorize(command).to_string()).or_default() += 1;
        debug!(command, success, ms = elapsed.as_millis() as u64, "Command logged");

        if m.total_commands % SAVE_EVERY == 0 {
            self.save();
        }
    }

    /// Record a 1..=10 satisfaction score.
    pub fn add_feedback(&mut self, feedback: &str, score: u32) -> anyhow::Result<()> {
        if !(1..=10).contains(&score) {
            anyhow::bail!("Scores go from 1 to 10.");
        }
        self.metrics.user_satisfaction.push(Feedback {
            timestamp: now_timestamp(),
            feedback: feedback.trim().to_string(),
            score: score as u8,
        });
        Ok(())
    }

    pub fn report(&self) -> PerformanceReport {
        let m = &self.metrics;
        let mean = |values: &[f64]| {
            if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            }
        };
        let scores: Vec<f64> = m.user_satisfaction.iter().map(|f| f64::from(f.score)).collect();
        let mut errors: Vec<(String, u32)> =
            m.error_types.iter().map(|(e, n)| (e.clone(), *n)).collect();
        errors.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        errors.truncate(TOP_ERRORS);

        PerformanceReport {
            uptime_hours: self.started.elapsed().as_secs_f64() / 3600.0,
            success_rate: if m.total_commands > 0 {
                f64::from(m.successful_commands) / f64::from(m.total_commands) * 100.0
            } else {
                0.0
            },
            average_response_time: mean(&m.response_times),
            total_commands: m.total_commands,
            command_breakdown: m.command_types.clone(),
            common_errors: errors,
            user_satisfaction_average: mean(&scores),
        }
    }

    /// Persist metrics and the current report. Failures are logged.
    pub fn save(&self) {
        let file = EvaluationFile {
            timestamp: now_timestamp(),
            metrics: &self.metrics,
            performance_report: self.report(),
        };
        if let Err(e) = save_json(&self.path, &file) {
            warn!("Failed to save evaluation: {}", e);
        }
    }
}
