//! Microphone capture + speech-to-text.
//!
//! The cpal stream is not `Send`, so a dedicated capture thread owns it and
//! serves one listen request at a time. Each request gets back the recorded
//! phrase (or nothing on timeout), which is then transcribed here.

use std::sync::mpsc as std_mpsc;
use std::time::{Duration, Instant};

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::{normalize_transcript, Heard, VoiceInput};
use crate::audio::vad::{Endpoint, Endpointer};
use crate::audio::{start_capture, MicStream};
use crate::config::InputConfig;
use crate::stt::SttAdapter;

/// No frames for this long means the device stopped delivering audio.
const STALL_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy)]
struct EndpointSettings {
    threshold: f32,
    listen: Duration,
    phrase_limit: Duration,
    pause: Duration,
}

impl EndpointSettings {
    fn from_config(config: &InputConfig) -> Self {
        Self {
            threshold: config.energy_threshold,
            listen: Duration::from_secs(config.listen_timeout_secs),
            phrase_limit: Duration::from_secs(config.phrase_limit_secs),
            pause: Duration::from_secs_f32(config.pause_secs.max(0.1)),
        }
    }
}

type ListenReply = oneshot::Sender<Option<Vec<f32>>>;

pub struct MicrophoneInput {
    requests: std_mpsc::Sender<ListenReply>,
    stt: SttAdapter,
}

impl MicrophoneInput {
    /// Open the capture device on its own thread. Fails if the device
    /// cannot be opened.
    pub fn start(config: &InputConfig, stt: SttAdapter) -> anyhow::Result<Self> {
        let settings = EndpointSettings::from_config(config);
        let device = config.device.clone();
        let (requests, request_rx) = std_mpsc::channel::<ListenReply>();
        let (ready_tx, ready_rx) = std_mpsc::sync_channel::<anyhow::Result<()>>(1);

        std::thread::Builder::new()
            .name("mic-capture".into())
            .spawn(move || match start_capture(device.as_deref()) {
                Ok(mic) => {
                    let _ = ready_tx.send(Ok(()));
                    capture_loop(mic, settings, request_rx);
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            })?;

        ready_rx
            .recv()
            .map_err(|_| anyhow::anyhow!("Capture thread exited during startup"))??;
        info!("Microphone input ready");
        Ok(Self { requests, stt })
    }
}

fn capture_loop(
    mut mic: MicStream,
    settings: EndpointSettings,
    requests: std_mpsc::Receiver<ListenReply>,
) {
    for reply in requests {
        // anything buffered while we were speaking is our own voice
        mic.discard_pending();
        let phrase = record_phrase(&mut mic, settings);
        let _ = reply.send(phrase);
    }
    debug!("Capture thread exiting");
}

fn record_phrase(mic: &mut MicStream, settings: EndpointSettings) -> Option<Vec<f32>> {
    let mut endpointer = Endpointer::new(
        settings.threshold,
        settings.listen,
        settings.phrase_limit,
        settings.pause,
    );
    let mut last_frame = Instant::now();

    loop {
        let Some(frame) = mic.next_frame() else {
            if last_frame.elapsed() > STALL_TIMEOUT {
                warn!("Microphone stopped delivering audio");
                return None;
            }
            std::thread::sleep(Duration::from_millis(10));
            continue;
        };
        last_frame = Instant::now();

        match endpointer.push(&frame) {
            Endpoint::Waiting | Endpoint::Recording => {}
            Endpoint::TimedOut => return None,
            Endpoint::Complete => return Some(endpointer.into_audio()),
        }
    }
}

impl VoiceInput for MicrophoneInput {
    async fn listen(&mut self) -> Heard {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.requests.send(reply_tx).is_err() {
            return Heard::Closed;
        }
        let audio = match reply_rx.await {
            Ok(Some(audio)) => audio,
            Ok(None) => return Heard::Silence,
            Err(_) => return Heard::Closed,
        };

        debug!(samples = audio.len(), "Phrase captured");
        match self.stt.transcribe(&audio).await {
            Ok(text) => normalize_transcript(&text).into(),
            Err(e) => {
                warn!("Transcription failed: {}", e);
                Heard::Silence
            }
        }
    }
}
