//! IPC bridge: stdin reader and stdout event emitter.
//!
//! A blocking stdin reader thread sends parsed commands through an mpsc
//! channel; `EventSink` writes JSON-line events to stdout.

use std::io::{self, BufRead, Write};

use tokio::sync::mpsc;
use tracing::{debug, error};

use super::{AssistantEvent, HostCommand};

/// Where assistant events go. Disabled sinks drop everything (tests, and
/// hosts that only read the log).
#[derive(Debug, Clone, Copy)]
pub struct EventSink {
    enabled: bool,
}

impl EventSink {
    pub fn stdout() -> Self {
        Self { enabled: true }
    }

    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    /// Emit an `AssistantEvent` as a JSON line on stdout and flush.
    pub fn emit(&self, event: &AssistantEvent) {
        if !self.enabled {
            return;
        }
        let json = match serde_json::to_string(event) {
            Ok(j) => j,
            Err(e) => {
                error!("Failed to serialize event: {}", e);
                return;
            }
        };
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        // Ignore write/flush errors: pipe may be closed.
        let _ = writeln!(handle, "{}", json);
        let _ = handle.flush();
    }

    /// Convenience helper for emitting error events.
    pub fn error(&self, message: &str) {
        self.emit(&AssistantEvent::Error {
            message: message.to_string(),
        });
    }
}

/// Normalize incoming JSON: if it has a `"type"` field but no `"command"`
/// field, rename `"type"` to `"command"` so serde can deserialize it.
fn normalize_command_json(input: &str) -> String {
    if let Ok(mut obj) = serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(input)
    {
        if !obj.contains_key("command") {
            if let Some(type_val) = obj.remove("type") {
                obj.insert("command".to_string(), type_val);
                if let Ok(json) = serde_json::to_string(&obj) {
                    return json;
                }
            }
        }
    }
    input.to_string()
}

/// Parse one stdin line. JSON objects must be valid commands; anything else
/// is taken as a plain typed utterance.
pub fn parse_line(line: &str) -> Result<Option<HostCommand>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if !trimmed.starts_with('{') {
        return Ok(Some(HostCommand::Utterance {
            text: trimmed.to_string(),
        }));
    }
    let normalized = normalize_command_json(trimmed);
    serde_json::from_str::<HostCommand>(&normalized)
        .map(Some)
        .map_err(|e| format!("Invalid JSON command: {}", e))
}

/// Spawn a blocking thread that reads lines from stdin, parses them into
/// `HostCommand`, and forwards them through the returned channel.
///
/// The thread exits when stdin is closed (host process gone) or on
/// unrecoverable read error; the channel then closes.
pub fn spawn_stdin_reader(events: EventSink) -> mpsc::UnboundedReceiver<HostCommand> {
    let (tx, rx) = mpsc::unbounded_channel();

    std::thread::spawn(move || {
        let stdin = io::stdin();
        let reader = stdin.lock();
        for line in reader.lines() {
            match line {
                Ok(text) => match parse_line(&text) {
                    Ok(Some(cmd)) => {
                        debug!(?cmd, "Received command from host");
                        if tx.send(cmd).is_err() {
                            break; // receiver dropped
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        error!("{} (input: {})", e, text.trim());
                        events.error(&e);
                    }
                },
                Err(e) => {
                    error!("stdin read error: {}", e);
                    break;
                }
            }
        }
        debug!("stdin reader thread exiting");
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_utterance() {
        assert_eq!(
            parse_line("  Open Notepad \n").unwrap(),
            Some(HostCommand::Utterance {
                text: "Open Notepad".into()
            })
        );
    }

    #[test]
    fn test_blank_line_skipped() {
        assert_eq!(parse_line("   ").unwrap(), None);
    }

    #[test]
    fn test_type_key_normalized() {
        assert_eq!(
            parse_line(r#"{"type":"system_speak","text":"hi"}"#).unwrap(),
            Some(HostCommand::SystemSpeak { text: "hi".into() })
        );
    }

    #[test]
    fn test_unknown_command_is_error() {
        assert!(parse_line(r#"{"command":"launch_rockets"}"#).is_err());
    }
}
