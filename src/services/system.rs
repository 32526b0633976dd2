//! Host statistics, battery and power control.

use std::process::Command;
use std::time::Duration;

use starship_battery::units::{ratio::percent, time::second};
use starship_battery::{Manager, State};
use sysinfo::{Disks, System, MINIMUM_CPU_UPDATE_INTERVAL};
use tracing::{info, warn};

const GB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SystemStats {
    pub cpu_percent: f32,
    pub cores: usize,
    pub memory_total_gb: f64,
    pub memory_used_gb: f64,
    pub memory_available_gb: f64,
}

impl SystemStats {
    pub fn memory_percent(&self) -> f64 {
        if self.memory_total_gb <= 0.0 {
            return 0.0;
        }
        self.memory_used_gb / self.memory_total_gb * 100.0
    }

    pub fn describe(&self) -> String {
        format!(
            "CPU usage is {:.1}% across {} cores. RAM usage is {:.0}%. Using {:.2} GB out of {:.2} GB. {:.2} GB available.",
            self.cpu_percent,
            self.cores,
            self.memory_percent(),
            self.memory_used_gb,
            self.memory_total_gb,
            self.memory_available_gb
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiskUsage {
    pub name: String,
    pub mount_point: String,
    pub total_gb: f64,
    pub free_gb: f64,
}

impl DiskUsage {
    pub fn describe(&self) -> String {
        let used_percent = if self.total_gb > 0.0 {
            (self.total_gb - self.free_gb) / self.total_gb * 100.0
        } else {
            0.0
        };
        format!(
            "{} has {:.2} GB free out of {:.2} GB. {:.0}% used.",
            self.mount_point, self.free_gb, self.total_gb, used_percent
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeState {
    Charging,
    Discharging,
    Full,
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatteryStatus {
    pub percent: f32,
    pub state: ChargeState,
    /// Only reported while discharging.
    pub time_left: Option<Duration>,
}

impl BatteryStatus {
    pub fn describe(&self) -> String {
        let level = self.percent.clamp(0.0, 100.0).round();
        match (self.state, self.time_left) {
            (ChargeState::Charging, _) => format!("Battery is at {:.0}% and charging.", level),
            (ChargeState::Full, _) => format!("Battery is full at {:.0}%.", level),
            (ChargeState::Discharging, Some(left)) => {
                let minutes = left.as_secs() / 60;
                format!(
                    "Battery is at {:.0}%. Approximately {} hours and {} minutes remaining.",
                    level,
                    minutes / 60,
                    minutes % 60
                )
            }
            _ => format!("Battery is at {:.0}%.", level),
        }
    }
}

/// Holds one `System` so CPU deltas are measured between refreshes.
pub struct SystemMonitor {
    sys: System,
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemMonitor {
    pub fn new() -> Self {
        Self { sys: System::new() }
    }

    pub async fn stats(&mut self) -> SystemStats {
        self.sys.refresh_cpu_usage();
        tokio::time::sleep(MINIMUM_CPU_UPDATE_INTERVAL).await;
        self.sys.refresh_cpu_usage();
        self.sys.refresh_memory();

        SystemStats {
            cpu_percent: self.sys.global_cpu_usage(),
            cores: self.sys.cpus().len(),
            memory_total_gb: self.sys.total_memory() as f64 / GB,
            memory_used_gb: self.sys.used_memory() as f64 / GB,
            memory_available_gb: self.sys.available_memory() as f64 / GB,
        }
    }

    pub fn disks(&self) -> Vec<DiskUsage> {
        let disks = Disks::new_with_refreshed_list();
        let mut usage: Vec<DiskUsage> = disks
            .list()
            .iter()
            .filter(|d| d.total_space() > 0)
            .map(|d| DiskUsage {
                name: d.name().to_string_lossy().to_string(),
                mount_point: d.mount_point().display().to_string(),
                total_gb: d.total_space() as f64 / GB,
                free_gb: d.available_space() as f64 / GB,
            })
            .collect();
        usage.sort_by(|a, b| a.mount_point.cmp(&b.mount_point));
        usage.dedup_by(|a, b| a.name == b.name && a.total_gb == b.total_gb);
        usage
    }

    /// First battery the platform reports, or `None` on machines without one.
    pub fn battery(&self) -> anyhow::Result<Option<BatteryStatus>> {
        let manager = Manager::new()
            .map_err(|e| anyhow::anyhow!("Battery information is unavailable: {}", e))?;
        let Some(battery) = manager.batteries()?.next().transpose()? else {
            return Ok(None);
        };
        let state = match battery.state() {
            State::Charging => ChargeState::Charging,
            State::Discharging => ChargeState::Discharging,
            State::Full => ChargeState::Full,
            _ => ChargeState::Unknown,
        };
        let time_left = battery
            .time_to_empty()
            .map(|t| t.get::<second>())
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(Duration::from_secs_f32);
        Ok(Some(BatteryStatus {
            percent: battery.state_of_charge().get::<percent>(),
            state,
            time_left,
        }))
    }
}

pub trait PowerControl: Send + Sync {
    fn shutdown(&self) -> anyhow::Result<()>;
    fn restart(&self) -> anyhow::Result<()>;
    fn sleep(&self) -> anyhow::Result<()>;
}

/// Drives the machine's power state through the platform commands.
pub struct SystemPower;

impl SystemPower {
    fn run(program: &str, args: &[&str]) -> anyhow::Result<()> {
        let status = Command::new(program)
            .args(args)
            .status()
            .map_err(|e| anyhow::anyhow!("Could not run {}: {}", program, e))?;
        if !status.success() {
            warn!(program, code = ?status.code(), "power command failed");
            anyhow::bail!("The {} command was refused", program);
        }
        Ok(())
    }
}

impl PowerControl for SystemPower {
    fn shutdown(&self) -> anyhow::Result<()> {
        info!("Shutting down the system");
        if cfg!(target_os = "windows") {
            Self::run("shutdown", &["/s", "/t", "1"])
        } else {
            Self::run("shutdown", &["-h", "now"])
        }
    }

    fn restart(&self) -> anyhow::Result<()> {
        info!("Restarting the system");
        if cfg!(target_os = "windows") {
            Self::run("shutdown", &["/r", "/t", "1"])
        } else {
            Self::run("shutdown", &["-r", "now"])
        }
    }

    fn sleep(&self) -> anyhow::Result<()> {
        info!("Suspending the system");
        if cfg!(target_os = "windows") {
            Self::run("rundll32.exe", &["powrprof.dll,SetSuspendState", "0,1,0"])
        } else if cfg!(target_os = "macos") {
            Self::run("pmset", &["sleepnow"])
        } else {
            Self::run("systemctl", &["suspend"])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_stats() {
        let stats = SystemStats {
            cpu_percent: 12.34,
            cores: 8,
            memory_total_gb: 16.0,
            memory_used_gb: 4.0,
            memory_available_gb: 12.0,
        };
        assert_eq!(
            stats.describe(),
            "CPU usage is 12.3% across 8 cores. RAM usage is 25%. Using 4.00 GB out of 16.00 GB. 12.00 GB available."
        );
    }

    #[test]
    fn test_describe_disk() {
        let disk = DiskUsage {
            name: "sda1".into(),
            mount_point: "/".into(),
            total_gb: 100.0,
            free_gb: 40.0,
        };
        assert_eq!(disk.describe(), "/ has 40.00 GB free out of 100.00 GB. 60% used.");
    }

    #[test]
    fn test_describe_battery() {
        let mut status = BatteryStatus {
            percent: 76.6,
            state: ChargeState::Charging,
            time_left: None,
        };
        assert_eq!(status.describe(), "Battery is at 77% and charging.");
        status.state = ChargeState::Discharging;
        status.time_left = Some(Duration::from_secs(2 * 3600 + 15 * 60));
        assert_eq!(
            status.describe(),
            "Battery is at 77%. Approximately 2 hours and 15 minutes remaining."
        );
        status.time_left = None;
        assert_eq!(status.describe(), "Battery is at 77%.");
        status.state = ChargeState::Full;
        status.percent = 100.0;
        assert_eq!(status.describe(), "Battery is full at 100%.");
    }

    #[tokio::test]
    async fn test_live_stats_are_sane() {
        let mut monitor = SystemMonitor::new();
        let stats = monitor.stats().await;
        assert!(stats.cores > 0);
        assert!(stats.memory_total_gb > 0.0);
        assert!(stats.cpu_percent >= 0.0);
    }
}
