//! Optimus entry point.
//!
//! Events go out as JSON lines on stdout, logs go to stderr and the rolling
//! log file. Startup wires the speech queue, the configured input source and
//! the feature services together, then hands control to the dispatch loop.

use std::time::Duration;

use tracing::{error, info, warn};

use optimus::assistant::{Assistant, Profile};
use optimus::config::paths::get_log_dir;
use optimus::config::{ensure_data_dir, read_assistant_config, InputMode};
use optimus::input::{InputSource, MicrophoneInput, StdinInput};
use optimus::ipc::bridge::{spawn_stdin_reader, EventSink};
use optimus::ipc::AssistantEvent;
use optimus::services::Services;
use optimus::speech::{SpeechHandle, SpeechSettings};
use optimus::stt::create_stt_engine;
use optimus::tts::{create_tts_engine, ConsoleTts, TtsEngine};
use optimus::{logger, reminders};

#[tokio::main]
async fn main() {
    let events = EventSink::stdout();

    // Emit starting event immediately so the host knows we're alive.
    events.emit(&AssistantEvent::Starting {});

    if let Err(e) = run(events).await {
        error!("Startup failed: {:#}", e);
        events.error(&format!("{:#}", e));
        events.emit(&AssistantEvent::Stopping {});
        std::process::exit(1);
    }
}

fn loading(events: EventSink, step: &str) {
    events.emit(&AssistantEvent::Loading {
        step: step.to_string(),
    });
}

async fn run(events: EventSink) -> anyhow::Result<()> {
    let data_dir = ensure_data_dir()?;
    if let Err(e) = logger::init(&get_log_dir(&data_dir)) {
        eprintln!("Logging unavailable: {}", e);
    }

    loading(events, "Reading configuration...");
    let config = read_assistant_config(&data_dir);
    info!(
        data_dir = %data_dir.display(),
        input = ?config.input.mode,
        stt = %config.stt.adapter,
        tts = %config.tts.adapter,
        "Configuration loaded"
    );

    loading(events, "Loading TTS engine...");
    let engine: Box<dyn TtsEngine> = match create_tts_engine(&config.tts) {
        Ok(engine) => engine,
        Err(e) => {
            warn!("TTS unavailable, speaking to the console: {}", e);
            Box::new(ConsoleTts)
        }
    };
    let settings = SpeechSettings {
        speaker: config.assistant_name.clone(),
        play_audio: config.plays_audio(),
        volume: config.tts.volume.unwrap_or(1.0),
    };
    let speech = SpeechHandle::spawn(engine, settings, events);

    let input = match config.input.mode {
        InputMode::Stdin => {
            loading(events, "Starting IPC bridge...");
            let commands = spawn_stdin_reader(events);
            InputSource::Stdin(StdinInput::new(
                commands,
                speech.clone(),
                events,
                Duration::from_secs(config.input.listen_timeout_secs),
            ))
        }
        InputMode::Microphone => {
            loading(events, "Loading STT model...");
            let stt = create_stt_engine(&config.stt, &data_dir)?;
            loading(events, "Initializing audio...");
            InputSource::Microphone(MicrophoneInput::start(&config.input, stt)?)
        }
    };

    loading(events, "Starting services...");
    let services = Services::new(&config, &data_dir);
    let _reminders = reminders::spawn(&data_dir, &config.reminders, speech.clone());

    events.emit(&AssistantEvent::Ready {});
    info!("Optimus ready");

    let profile = Profile {
        assistant_name: config.assistant_name.clone(),
        user_name: config.user_name.clone(),
    };
    let mut assistant = Assistant::new(input, speech, events, services, profile);
    assistant.run().await;

    events.emit(&AssistantEvent::Stopping {});
    info!("Optimus shutting down");
    Ok(())
}
