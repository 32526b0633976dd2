//! Test doubles shared by the unit tests: a recording speech engine, a
//! scripted voice input, and recording collaborators.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::input::{normalize_transcript, Heard, VoiceInput};
use crate::ipc::bridge::EventSink;
use crate::services::apps::{AppLauncher, CloseOutcome};
use crate::services::codegen::CodeGenerator;
use crate::services::contacts::ContactBook;
use crate::services::evaluator::AgentEvaluator;
use crate::services::mail::{MailTransport, OutgoingMail, SendFuture};
use crate::services::mcp::McpClient;
use crate::services::music::MusicPlayer;
use crate::services::notes::NotesStore;
use crate::services::system::{PowerControl, SystemMonitor};
use crate::services::tasks::TaskStore;
use crate::services::web::WebClient;
use crate::services::Services;
use crate::speech::{SpeechHandle, SpeechSettings};
use crate::tts::{SpeakFuture, SpeechAudio, TtsEngine};

type Log<T> = Arc<Mutex<Vec<T>>>;

struct RecordingEngine {
    lines: Log<String>,
    fail_on: Option<String>,
}

impl TtsEngine for RecordingEngine {
    fn speak(&self, text: &str) -> SpeakFuture<'_> {
        self.lines.lock().unwrap().push(text.to_string());
        let fail = self.fail_on.as_deref() == Some(text);
        Box::pin(async move {
            if fail {
                anyhow::bail!("synthesis failed");
            }
            Ok(SpeechAudio::silent())
        })
    }

    fn name(&self) -> String {
        "Recording".to_string()
    }
}

/// A speech queue whose engine records every line it is asked to speak.
pub(crate) struct RecordingTts {
    lines: Log<String>,
    handle: SpeechHandle,
}

impl RecordingTts {
    fn build(fail_on: Option<String>) -> Self {
        let lines: Log<String> = Arc::default();
        let engine = RecordingEngine {
            lines: lines.clone(),
            fail_on,
        };
        let settings = SpeechSettings {
            speaker: "Optimus".to_string(),
            play_audio: false,
            volume: 1.0,
        };
        let handle = SpeechHandle::spawn(Box::new(engine), settings, EventSink::disabled());
        Self { lines, handle }
    }

    pub fn failing_on(text: &str) -> Self {
        Self::build(Some(text.to_string()))
    }

    pub fn handle(&self) -> SpeechHandle {
        self.handle.clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl Default for RecordingTts {
    fn default() -> Self {
        Self::build(None)
    }
}

/// Voice input that plays back a fixed script, then reports `Closed`.
pub(crate) struct ScriptedInput {
    script: VecDeque<Heard>,
}

impl ScriptedInput {
    pub fn new<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            script: lines
                .into_iter()
                .map(|l| Heard::from(normalize_transcript(l)))
                .collect(),
        }
    }

    pub fn silent(times: usize) -> Self {
        Self::from_heard(vec![Heard::Silence; times])
    }

    pub fn from_heard(script: Vec<Heard>) -> Self {
        Self {
            script: script.into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl VoiceInput for ScriptedInput {
    async fn listen(&mut self) -> Heard {
        self.script.pop_front().unwrap_or(Heard::Closed)
    }
}

#[derive(Clone, Default)]
pub(crate) struct RecordingLauncher {
    pub opened: Log<String>,
    pub closed: Log<String>,
    pub urls: Log<String>,
    pub failing: Arc<AtomicBool>,
    pub panicking: Arc<AtomicBool>,
}

impl RecordingLauncher {
    fn check(&self) -> anyhow::Result<()> {
        if self.panicking.load(Ordering::SeqCst) {
            panic!("launcher crashed");
        }
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("launcher unavailable");
        }
        Ok(())
    }
}

impl AppLauncher for RecordingLauncher {
    fn open(&self, name: &str) -> anyhow::Result<()> {
        self.check()?;
        self.opened.lock().unwrap().push(name.to_string());
        Ok(())
    }

    fn close(&self, name: &str) -> anyhow::Result<CloseOutcome> {
        self.check()?;
        self.closed.lock().unwrap().push(name.to_string());
        Ok(CloseOutcome::Closed)
    }

    fn open_url(&self, url: &str) -> anyhow::Result<()> {
        self.check()?;
        self.urls.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

#[derive(Clone, Default)]
pub(crate) struct RecordingMail {
    pub sent: Log<OutgoingMail>,
}

impl MailTransport for RecordingMail {
    fn send<'a>(&'a self, mail: &'a OutgoingMail) -> SendFuture<'a> {
        Box::pin(async move {
            let mut sent = self.sent.lock().unwrap();
            sent.push(mail.clone());
            Ok(format!("mail-{}", sent.len()))
        })
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

#[derive(Clone, Default)]
pub(crate) struct RecordingPower {
    pub calls: Log<&'static str>,
}

impl PowerControl for RecordingPower {
    fn shutdown(&self) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push("shutdown");
        Ok(())
    }

    fn restart(&self) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push("restart");
        Ok(())
    }

    fn sleep(&self) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push("sleep");
        Ok(())
    }
}

/// Handles onto the recording collaborators inside a test `Services`.
pub(crate) struct Mocks {
    pub apps: RecordingLauncher,
    pub mail: RecordingMail,
    pub power: RecordingPower,
}

/// Services over a temp data dir with side effects recorded, not performed.
pub(crate) fn test_services(data_dir: &Path) -> (Services, Mocks) {
    let mocks = Mocks {
        apps: RecordingLauncher::default(),
        mail: RecordingMail::default(),
        power: RecordingPower::default(),
    };
    let services = Services {
        apps: Box::new(mocks.apps.clone()),
        music: MusicPlayer::new(data_dir.join("music")),
        notes: NotesStore::open(data_dir),
        tasks: TaskStore::open(data_dir),
        contacts: ContactBook::open(data_dir),
        mail: Arc::new(mocks.mail.clone()),
        system: SystemMonitor::new(),
        power: Box::new(mocks.power.clone()),
        web: WebClient::new(Default::default()),
        codegen: CodeGenerator::new(Default::default(), data_dir),
        evaluator: AgentEvaluator::new(data_dir),
        mcp: McpClient::new(None),
    };
    (services, mocks)
}
