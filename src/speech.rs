//! Single-writer speech output.
//!
//! One dedicated thread owns the TTS engine and the output device and works
//! through a queue of speech requests, so two voices never overlap. The
//! dispatch loop waits for its lines to finish (`say`); background workers
//! enqueue and move on (`announce`).

use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

use crate::ipc::bridge::EventSink;
use crate::ipc::AssistantEvent;
use crate::tts::playback::AudioPlayer;
use crate::tts::TtsEngine;

struct SpeechRequest {
    text: String,
    done: Option<oneshot::Sender<()>>,
}

/// Output settings for the speech worker.
#[derive(Debug, Clone)]
pub struct SpeechSettings {
    /// Name used when logging spoken lines.
    pub speaker: String,
    /// Play synthesized audio on the default output device.
    pub play_audio: bool,
    pub volume: f32,
}

/// Cloneable handle to the speech queue.
#[derive(Clone)]
pub struct SpeechHandle {
    tx: mpsc::UnboundedSender<SpeechRequest>,
}

impl SpeechHandle {
    /// Start the speech worker thread.
    pub fn spawn(engine: Box<dyn TtsEngine>, settings: SpeechSettings, events: EventSink) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let spawned = std::thread::Builder::new()
            .name("speech".into())
            .spawn(move || speech_worker(engine, settings, events, rx));
        if let Err(e) = spawned {
            error!("Failed to start speech thread: {}", e);
        }
        Self { tx }
    }

    /// Speak `text` and wait until it has been played.
    pub async fn say(&self, text: impl Into<String>) {
        let (done_tx, done_rx) = oneshot::channel();
        let request = SpeechRequest {
            text: text.into(),
            done: Some(done_tx),
        };
        if self.tx.send(request).is_err() {
            warn!("Speech worker is gone; dropping line");
            return;
        }
        let _ = done_rx.await;
    }

    /// Queue `text` without waiting for it to be spoken.
    pub fn announce(&self, text: impl Into<String>) {
        let request = SpeechRequest {
            text: text.into(),
            done: None,
        };
        if self.tx.send(request).is_err() {
            warn!("Speech worker is gone; dropping announcement");
        }
    }
}

fn speech_worker(
    engine: Box<dyn TtsEngine>,
    settings: SpeechSettings,
    events: EventSink,
    mut rx: mpsc::UnboundedReceiver<SpeechRequest>,
) {
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to build speech runtime: {}", e);
            return;
        }
    };

    // rodio's output stream is tied to the thread that opened it
    let player = if settings.play_audio {
        match AudioPlayer::new(settings.volume) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!("Audio output unavailable, speaking to the log only: {}", e);
                None
            }
        }
    } else {
        None
    };

    info!(engine = %engine.name(), audio = player.is_some(), "Speech worker started");

    while let Some(request) = rx.blocking_recv() {
        let text = request.text.trim();
        if !text.is_empty() {
            info!("{}: {}", settings.speaker, text);
            events.emit(&AssistantEvent::SpeakingStart {
                text: text.to_string(),
            });

            match rt.block_on(engine.speak(text)) {
                Ok(audio) => {
                    if let Some(player) = &player {
                        if let Err(e) = player.play(&audio) {
                            warn!("Playback failed: {}", e);
                            events.error(&format!("Playback failed: {}", e));
                        }
                    }
                }
                Err(e) => {
                    warn!("Speech synthesis failed: {}", e);
                    events.error(&format!("Speech synthesis failed: {}", e));
                }
            }

            events.emit(&AssistantEvent::SpeakingEnd {});
        }
        if let Some(done) = request.done {
            let _ = done.send(());
        }
    }

    info!("Speech worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingTts;

    #[tokio::test]
    async fn test_say_waits_for_the_line() {
        let tts = RecordingTts::default();
        let speech = tts.handle();
        speech.say("Hello").await;
        speech.say("  ").await;
        assert_eq!(tts.lines(), vec!["Hello"]);
    }

    #[tokio::test]
    async fn test_announcements_keep_queue_order() {
        let tts = RecordingTts::default();
        let speech = tts.handle();
        speech.announce("first");
        speech.announce("second");
        speech.say("third").await;
        assert_eq!(tts.lines(), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_failed_synthesis_does_not_block_the_queue() {
        let tts = RecordingTts::failing_on("boom");
        let speech = tts.handle();
        speech.say("boom").await;
        speech.say("after").await;
        assert_eq!(tts.lines(), vec!["boom", "after"]);
    }
}
