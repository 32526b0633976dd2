//! Voice input sources.
//!
//! Every source yields one `Heard` per listen: a normalized utterance,
//! silence (timeout or nothing intelligible), or `Closed` when the source is
//! gone for good.

pub mod microphone;
pub mod stdin;

pub use microphone::MicrophoneInput;
pub use stdin::StdinInput;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Heard {
    /// Lower-cased, trimmed, non-empty transcript.
    Utterance(String),
    Silence,
    Closed,
}

#[allow(async_fn_in_trait)]
pub trait VoiceInput {
    /// Wait for the next utterance, bounded by the source's listen window.
    async fn listen(&mut self) -> Heard;
}

/// Lower-case and trim a raw transcript. Trailing sentence punctuation from
/// STT engines is dropped; an empty result means nothing was understood.
pub fn normalize_transcript(raw: &str) -> Option<String> {
    let text = raw
        .trim()
        .trim_end_matches(['.', '!', '?', ','])
        .trim()
        .to_lowercase();
    (!text.is_empty()).then_some(text)
}

impl From<Option<String>> for Heard {
    fn from(text: Option<String>) -> Self {
        match text {
            Some(t) => Heard::Utterance(t),
            None => Heard::Silence,
        }
    }
}

/// The configured input source.
pub enum InputSource {
    Stdin(StdinInput),
    Microphone(MicrophoneInput),
}

impl VoiceInput for InputSource {
    async fn listen(&mut self) -> Heard {
        match self {
            Self::Stdin(input) => input.listen().await,
            Self::Microphone(input) => input.listen().await,
        }
    }
}
