//! IPC protocol types for a host process driving the assistant.
//!
//! Events use `{"event": "<name>", "data": {...}}` format (assistant -> host).
//! Commands use `{"command": "<name>", ...}` format (host -> assistant).

pub mod bridge;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Events: assistant -> host (stdout)
// ---------------------------------------------------------------------------

/// All events emitted on stdout as JSON lines.
///
/// Serialized as `{"event": "<variant>", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
#[serde(rename_all = "snake_case")]
pub enum AssistantEvent {
    Starting {},
    Loading { step: String },
    Ready {},
    Listening {},
    Transcription { text: String },
    Intent {
        intent: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        argument: Option<String>,
    },
    SpeakingStart { text: String },
    SpeakingEnd {},
    Error { message: String },
    Pong {},
    Stopping {},
}

// ---------------------------------------------------------------------------
// Commands: host -> assistant (stdin)
// ---------------------------------------------------------------------------

/// All commands received on stdin as JSON lines.
///
/// Deserialized from `{"command": "<variant>", ...}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "command")]
#[serde(rename_all = "snake_case")]
pub enum HostCommand {
    /// A transcribed user utterance.
    Utterance { text: String },
    /// Speak text without running it through the classifier.
    SystemSpeak { text: String },
    Ping {},
    Stop {},
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let json = serde_json::to_string(&AssistantEvent::Transcription {
            text: "open notepad".into(),
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"event":"transcription","data":{"text":"open notepad"}}"#
        );
    }

    #[test]
    fn test_intent_event_omits_missing_argument() {
        let json = serde_json::to_string(&AssistantEvent::Intent {
            intent: "show_notes".into(),
            argument: None,
        })
        .unwrap();
        assert!(!json.contains("argument"));
    }

    #[test]
    fn test_command_parse() {
        let cmd: HostCommand =
            serde_json::from_str(r#"{"command":"utterance","text":"quit"}"#).unwrap();
        assert_eq!(cmd, HostCommand::Utterance { text: "quit".into() });

        let cmd: HostCommand = serde_json::from_str(r#"{"command":"ping"}"#).unwrap();
        assert_eq!(cmd, HostCommand::Ping {});
    }
}
