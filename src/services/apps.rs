//! Launching and closing desktop applications, opening URLs.

use std::collections::HashMap;
use std::process::{Command, Stdio};

use tracing::{debug, info};

/// Windows process image names for common spoken app names.
const WINDOWS_PROCESSES: &[(&str, &str)] = &[
    ("notepad", "notepad.exe"),
    ("calculator", "calculator.exe"),
    ("paint", "mspaint.exe"),
    ("word", "winword.exe"),
    ("excel", "excel.exe"),
    ("powerpoint", "powerpnt.exe"),
    ("chrome", "chrome.exe"),
    ("firefox", "firefox.exe"),
    ("edge", "msedge.exe"),
    ("file explorer", "explorer.exe"),
    ("command prompt", "cmd.exe"),
    ("task manager", "taskmgr.exe"),
    ("browser", "chrome.exe"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed,
    NotRunning,
}

pub trait AppLauncher: Send + Sync {
    fn open(&self, name: &str) -> anyhow::Result<()>;
    fn close(&self, name: &str) -> anyhow::Result<CloseOutcome>;
    fn open_url(&self, url: &str) -> anyhow::Result<()>;
}

/// Launches through configured aliases or the platform opener.
pub struct SystemAppLauncher {
    aliases: HashMap<String, String>,
}

impl SystemAppLauncher {
    pub fn new(aliases: HashMap<String, String>) -> Self {
        let aliases = aliases
            .into_iter()
            .map(|(name, cmd)| (name.trim().to_lowercase(), cmd))
            .collect();
        Self { aliases }
    }

    fn launch_command(&self, name: &str) -> Command {
        if let Some(line) = self.aliases.get(name) {
            let mut parts = line.split_whitespace();
            let mut cmd = Command::new(parts.next().unwrap_or(name));
            cmd.args(parts);
            return cmd;
        }
        if cfg!(target_os = "windows") {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", "", name]);
            cmd
        } else if cfg!(target_os = "macos") {
            let mut cmd = Command::new("open");
            cmd.args(["-a", name]);
            cmd
        } else {
            Command::new(name.replace(' ', "-"))
        }
    }

    /// The process to kill for a spoken app name.
    fn process_name(&self, name: &str) -> String {
        if cfg!(target_os = "windows") {
            return WINDOWS_PROCESSES
                .iter()
                .find(|(spoken, _)| *spoken == name)
                .map(|(_, image)| image.to_string())
                .unwrap_or_else(|| format!("{}.exe", name));
        }
        self.aliases
            .get(name)
            .and_then(|line| line.split_whitespace().next())
            .map(str::to_string)
            .unwrap_or_else(|| name.replace(' ', "-"))
    }
}

impl AppLauncher for SystemAppLauncher {
    fn open(&self, name: &str) -> anyhow::Result<()> {
        let name = name.trim().to_lowercase();
        // child output must not reach stdout, which carries IPC events
        self.launch_command(&name)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| anyhow::anyhow!("Could not launch {}: {}", name, e))?;
        info!(app = %name, "Application launched");
        Ok(())
    }

    fn close(&self, name: &str) -> anyhow::Result<CloseOutcome> {
        let name = name.trim().to_lowercase();
        let process = self.process_name(&name);
        let output = if cfg!(target_os = "windows") {
            Command::new("taskkill").args(["/f", "/im", &process]).output()
        } else {
            Command::new("pkill").args(["-f", &process]).output()
        }
        .map_err(|e| anyhow::anyhow!("Could not run process killer: {}", e))?;

        if output.status.success() {
            info!(app = %name, process = %process, "Application closed");
            return Ok(CloseOutcome::Closed);
        }
        let stderr = String::from_utf8_lossy(&output.stderr).to_lowercase();
        let stdout = String::from_utf8_lossy(&output.stdout).to_lowercase();
        debug!(code = ?output.status.code(), stderr = %stderr.trim(), "Process killer failed");
        // pkill exits 1 when nothing matched
        let not_found = stderr.contains("not found")
            || stdout.contains("no tasks")
            || (!cfg!(target_os = "windows") && output.status.code() == Some(1));
        if not_found {
            Ok(CloseOutcome::NotRunning)
        } else {
            anyhow::bail!("Could not close {}", name)
        }
    }

    fn open_url(&self, url: &str) -> anyhow::Result<()> {
        open::that_detached(url).map_err(|e| anyhow::anyhow!("Could not open {}: {}", url, e))?;
        info!(url, "Opened in browser");
        Ok(())
    }
}

/// Percent-encode a query string for use in a URL.
pub fn url_encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.trim().bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            other => out.push_str(&format!("%{:02X}", other)),
        }
    }
    out
}

pub fn youtube_search_url(query: &str) -> String {
    format!(
        "https://www.youtube.com/results?search_query={}",
        url_encode(query)
    )
}

pub fn google_search_url(query: &str) -> String {
    format!("https://www.google.com/search?q={}", url_encode(query))
}
