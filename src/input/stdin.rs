//! Transcripts delivered by a host process over stdin.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{normalize_transcript, Heard, VoiceInput};
use crate::ipc::bridge::EventSink;
use crate::ipc::{AssistantEvent, HostCommand};
use crate::speech::SpeechHandle;

pub struct StdinInput {
    commands: mpsc::UnboundedReceiver<HostCommand>,
    speech: SpeechHandle,
    events: EventSink,
    listen_timeout: Duration,
    closed: bool,
}

impl StdinInput {
    pub fn new(
        commands: mpsc::UnboundedReceiver<HostCommand>,
        speech: SpeechHandle,
        events: EventSink,
        listen_timeout: Duration,
    ) -> Self {
        Self {
            commands,
            speech,
            events,
            listen_timeout,
            closed: false,
        }
    }
}

impl VoiceInput for StdinInput {
    /// Wait for the next `utterance` command. Control commands that arrive
    /// meanwhile are served without ending the listen window.
    async fn listen(&mut self) -> Heard {
        if self.closed {
            return Heard::Closed;
        }
        let deadline = tokio::time::Instant::now() + self.listen_timeout;
        loop {
            let command = match tokio::time::timeout_at(deadline, self.commands.recv()).await {
                Ok(Some(command)) => command,
                Ok(None) => {
                    info!("stdin closed");
                    self.closed = true;
                    return Heard::Closed;
                }
                Err(_) => return Heard::Silence,
            };

            match command {
                HostCommand::Utterance { text } => return normalize_transcript(&text).into(),
                HostCommand::SystemSpeak { text } => {
                    debug!(text = %text, "System speak requested");
                    self.speech.announce(text);
                }
                HostCommand::Ping {} => self.events.emit(&AssistantEvent::Pong {}),
                HostCommand::Stop {} => {
                    info!("Stop requested by host");
                    self.closed = true;
                    return Heard::Closed;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingTts;

    fn stdin_input(timeout_ms: u64) -> (mpsc::UnboundedSender<HostCommand>, StdinInput, RecordingTts) {
        let (tx, rx) = mpsc::unbounded_channel();
        let tts = RecordingTts::default();
        let input = StdinInput::new(
            rx,
            tts.handle(),
            EventSink::disabled(),
            Duration::from_millis(timeout_ms),
        );
        (tx, input, tts)
    }

    #[tokio::test]
    async fn test_utterance_is_normalized() {
        let (tx, mut input, _tts) = stdin_input(1_000);
        tx.send(HostCommand::Utterance {
            text: "Open Notepad".into(),
        })
        .unwrap();
        assert_eq!(input.listen().await, Heard::Utterance("open notepad".into()));
    }

    #[tokio::test]
    async fn test_timeout_is_silence() {
        let (_tx, mut input, _tts) = stdin_input(20);
        assert_eq!(input.listen().await, Heard::Silence);
    }

    #[tokio::test]
    async fn test_control_commands_do_not_end_the_listen() {
        let (tx, mut input, tts) = stdin_input(1_000);
        tx.send(HostCommand::Ping {}).unwrap();
        tx.send(HostCommand::SystemSpeak {
            text: "Reminder".into(),
        })
        .unwrap();
        tx.send(HostCommand::Utterance { text: "help".into() }).unwrap();
        assert_eq!(input.listen().await, Heard::Utterance("help".into()));
        tts.handle().say("").await;
        assert_eq!(tts.lines(), vec!["Reminder"]);
    }

    #[tokio::test]
    async fn test_stop_and_eof_close_the_input() {
        let (tx, mut input, _tts) = stdin_input(1_000);
        tx.send(HostCommand::Stop {}).unwrap();
        assert_eq!(input.listen().await, Heard::Closed);
        assert_eq!(input.listen().await, Heard::Closed);

        let (tx, mut input, _tts) = stdin_input(1_000);
        drop(tx);
        assert_eq!(input.listen().await, Heard::Closed);
    }
}
