//! Turn-taking dialogue: ask for a missing parameter, confirm an action.
//!
//! A step aborts with `DialogueAbort`, which propagates through handlers with
//! `?` and is turned into a spoken cancellation notice at the boundary.
//! Handlers collect every parameter before their side effect, so an abort
//! never leaves anything half done.

use std::fmt;

use tracing::{debug, info};

use crate::classifier::{strip_fillers, tokenize};
use crate::input::{Heard, VoiceInput};
use crate::ipc::bridge::EventSink;
use crate::ipc::AssistantEvent;
use crate::speech::SpeechHandle;

const REPROMPT: &str = "Sorry, I didn't catch that.";

const CANCEL_WORDS: &[&str] = &["cancel", "no", "stop", "never mind", "nevermind", "abort"];
const AFFIRMATIVE: &[&str] = &[
    "yes",
    "ok",
    "okay",
    "yeah",
    "yep",
    "sure",
    "confirm",
    "affirmative",
];
const NEGATION: &[&str] = &["no", "not", "don't", "cancel"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueAbort {
    /// The user said a cancel word.
    Cancelled,
    /// Nothing was heard, even after a re-prompt.
    NoResponse,
    /// The answer could not be used (bad address, unknown id, ...).
    Invalid(String),
}

impl DialogueAbort {
    /// What the assistant says when a step aborts.
    pub fn notice(&self) -> String {
        match self {
            Self::Cancelled => "Okay, cancelled.".to_string(),
            Self::NoResponse => "I didn't hear anything, so I've cancelled that.".to_string(),
            Self::Invalid(reason) => format!("{} Cancelled.", reason),
        }
    }
}

impl fmt::Display for DialogueAbort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => f.write_str("dialogue cancelled"),
            Self::NoResponse => f.write_str("no response"),
            Self::Invalid(reason) => write!(f, "invalid response: {}", reason),
        }
    }
}

impl std::error::Error for DialogueAbort {}

/// True when the whole response is a cancel word, or starts with "cancel".
pub fn is_cancel(response: &str) -> bool {
    let tokens = strip_fillers(&tokenize(response));
    let joined = tokens.join(" ");
    CANCEL_WORDS.contains(&joined.as_str()) || tokens.first().is_some_and(|t| t == "cancel")
}

/// Affirmative word present and no negation anywhere.
pub fn is_affirmative(response: &str) -> bool {
    let tokens = tokenize(response);
    let yes = tokens.iter().any(|t| AFFIRMATIVE.contains(&t.as_str()));
    let no = tokens.iter().any(|t| NEGATION.contains(&t.as_str()));
    yes && !no
}

/// One conversation turn's view of the input and output collaborators.
pub struct Dialogue<'a, I: VoiceInput> {
    input: &'a mut I,
    speech: &'a SpeechHandle,
    events: EventSink,
}

impl<'a, I: VoiceInput> Dialogue<'a, I> {
    pub fn new(input: &'a mut I, speech: &'a SpeechHandle, events: EventSink) -> Self {
        Self {
            input,
            speech,
            events,
        }
    }

    pub fn speech(&self) -> &SpeechHandle {
        self.speech
    }

    /// Speak and wait until done.
    pub async fn say(&self, text: impl Into<String>) {
        self.speech.say(text).await;
    }

    /// Listen once, reporting the transcript to the host.
    pub async fn hear(&mut self) -> Heard {
        self.events.emit(&AssistantEvent::Listening {});
        let heard = self.input.listen().await;
        if let Heard::Utterance(text) = &heard {
            info!("User: {}", text);
            self.events.emit(&AssistantEvent::Transcription { text: text.clone() });
        }
        heard
    }

    /// Prompt and listen, re-prompting once after silence. `None` means
    /// nothing was heard twice.
    async fn prompt_twice(&mut self, prompt: &str) -> Result<Option<String>, DialogueAbort> {
        self.say(prompt).await;
        for attempt in 0..2 {
            match self.hear().await {
                Heard::Utterance(text) if is_cancel(&text) => {
                    debug!(prompt, "Dialogue cancelled");
                    return Err(DialogueAbort::Cancelled);
                }
                Heard::Utterance(text) => return Ok(Some(text)),
                Heard::Closed => return Err(DialogueAbort::NoResponse),
                Heard::Silence if attempt == 0 => {
                    self.say(format!("{} {}", REPROMPT, prompt)).await;
                }
                Heard::Silence => {}
            }
        }
        Ok(None)
    }

    /// Ask for a required value.
    pub async fn ask(&mut self, prompt: &str) -> Result<String, DialogueAbort> {
        self.prompt_twice(prompt)
            .await?
            .ok_or(DialogueAbort::NoResponse)
    }

    /// Ask for a value that has a default; silence keeps the default.
    pub async fn ask_optional(&mut self, prompt: &str) -> Result<Option<String>, DialogueAbort> {
        self.prompt_twice(prompt).await
    }

    /// Ask a yes/no question. Anything but a clear yes is a no.
    pub async fn confirm(&mut self, prompt: &str) -> bool {
        self.say(prompt).await;
        match self.hear().await {
            Heard::Utterance(text) => is_affirmative(&text),
            Heard::Silence | Heard::Closed => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingTts, ScriptedInput};

    #[test]
    fn test_cancel_words() {
        for text in ["cancel", "no", "stop", "never mind", "nevermind", "abort", "cancel that", "no please"] {
            assert!(is_cancel(text), "{text}");
        }
        for text in ["john", "no idea what to write", "stop by the store"] {
            assert!(!is_cancel(text), "{text}");
        }
    }

    #[test]
    fn test_affirmative() {
        for text in ["yes", "ok", "yeah go ahead", "sure thing", "yes please"] {
            assert!(is_affirmative(text), "{text}");
        }
        for text in ["no", "not yet", "yes, no wait", "don't", "maybe", "", "cancel ok"] {
            assert!(!is_affirmative(text), "{text}");
        }
    }

    #[tokio::test]
    async fn test_ask_returns_answer() {
        let tts = RecordingTts::default();
        let speech = tts.handle();
        let mut input = ScriptedInput::new(["john"]);
        let mut dlg = Dialogue::new(&mut input, &speech, EventSink::disabled());
        assert_eq!(dlg.ask("Who is the recipient?").await.unwrap(), "john");
        assert_eq!(tts.lines(), vec!["Who is the recipient?"]);
    }

    #[tokio::test]
    async fn test_ask_reprompts_once_then_gives_up() {
        let tts = RecordingTts::default();
        let speech = tts.handle();
        let mut input = ScriptedInput::silent(2);
        let mut dlg = Dialogue::new(&mut input, &speech, EventSink::disabled());
        assert_eq!(dlg.ask("Subject?").await, Err(DialogueAbort::NoResponse));
        assert_eq!(
            tts.lines(),
            vec!["Subject?", "Sorry, I didn't catch that. Subject?"]
        );
        assert_eq!(input.remaining(), 0);
    }

    #[tokio::test]
    async fn test_ask_recovers_after_one_silence() {
        let tts = RecordingTts::default();
        let speech = tts.handle();
        let mut input = ScriptedInput::from_heard(vec![
            Heard::Silence,
            Heard::Utterance("hello".into()),
        ]);
        let mut dlg = Dialogue::new(&mut input, &speech, EventSink::disabled());
        assert_eq!(dlg.ask("Subject?").await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_cancel_aborts_immediately() {
        let tts = RecordingTts::default();
        let speech = tts.handle();
        let mut input = ScriptedInput::new(["cancel", "never heard"]);
        let mut dlg = Dialogue::new(&mut input, &speech, EventSink::disabled());
        assert_eq!(dlg.ask("Recipient?").await, Err(DialogueAbort::Cancelled));
        assert_eq!(input.remaining(), 1);
    }

    #[tokio::test]
    async fn test_ask_optional_silence_is_none() {
        let tts = RecordingTts::default();
        let speech = tts.handle();
        let mut input = ScriptedInput::silent(2);
        let mut dlg = Dialogue::new(&mut input, &speech, EventSink::disabled());
        assert_eq!(dlg.ask_optional("Category?").await, Ok(None));
    }

    #[tokio::test]
    async fn test_confirm_silence_is_decline() {
        let tts = RecordingTts::default();
        let speech = tts.handle();
        let mut input = ScriptedInput::silent(1);
        let mut dlg = Dialogue::new(&mut input, &speech, EventSink::disabled());
        assert!(!dlg.confirm("Shut down?").await);

        let mut input = ScriptedInput::new(["yes"]);
        let mut dlg = Dialogue::new(&mut input, &speech, EventSink::disabled());
        assert!(dlg.confirm("Shut down?").await);
    }

    #[test]
    fn test_abort_is_an_anyhow_error() {
        let err: anyhow::Error = DialogueAbort::Cancelled.into();
        assert_eq!(
            err.downcast_ref::<DialogueAbort>(),
            Some(&DialogueAbort::Cancelled)
        );
    }
}
