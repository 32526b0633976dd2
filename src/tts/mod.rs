//! Text-to-Speech adapters and playback.
//!
//! Provides a common `TtsEngine` trait with implementations for:
//! - Console output (no audio, the spoken line is only logged)
//! - OpenAI TTS API
//! - ElevenLabs TTS API

pub mod cloud;
pub mod mp3;
pub mod playback;

use std::future::Future;
use std::pin::Pin;

use crate::config::TtsConfig;

/// Synthesized speech, mono f32 PCM.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeechAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl SpeechAudio {
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

pub type SpeakFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<SpeechAudio>> + Send + 'a>>;

/// Common trait for all TTS engines (dyn-compatible).
pub trait TtsEngine: Send + Sync {
    /// Synthesize text to PCM audio. Engines without audio return silence.
    fn speak(&self, text: &str) -> SpeakFuture<'_>;

    /// Display name for this engine (e.g. "OpenAI TTS (alloy)").
    fn name(&self) -> String;
}

/// Engine that produces no audio. The speech worker still logs and emits
/// events for every line, so the console transcript is the output.
pub struct ConsoleTts;

impl TtsEngine for ConsoleTts {
    fn speak(&self, _text: &str) -> SpeakFuture<'_> {
        Box::pin(async { Ok(SpeechAudio::silent()) })
    }

    fn name(&self) -> String {
        "Console".to_string()
    }
}

/// Create a TTS engine from config.
///
/// `adapter` is one of: "console", "openai-tts", "elevenlabs".
pub fn create_tts_engine(config: &TtsConfig) -> anyhow::Result<Box<dyn TtsEngine>> {
    match config.adapter.as_str() {
        "console" => Ok(Box::new(ConsoleTts)),
        "openai-tts" => {
            let key = config
                .api_key
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("OpenAI TTS requires an API key"))?;
            let voice = config.voice.as_deref().unwrap_or("alloy");
            Ok(Box::new(cloud::OpenAiTts::new(key, voice)))
        }
        "elevenlabs" => {
            let key = config
                .api_key
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("ElevenLabs TTS requires an API key"))?;
            let voice = config.voice.as_deref().unwrap_or("21m00Tcm4TlvDq8ikWAM");
            Ok(Box::new(cloud::ElevenLabsTts::new(key, voice)))
        }
        other => anyhow::bail!("Unknown TTS adapter: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_console_engine_is_silent() {
        let engine = create_tts_engine(&TtsConfig::default()).unwrap();
        assert_eq!(engine.name(), "Console");
        assert!(engine.speak("Hello").await.unwrap().is_empty());
    }

    #[test]
    fn test_cloud_engines_require_keys() {
        for adapter in ["openai-tts", "elevenlabs"] {
            let cfg = TtsConfig {
                adapter: adapter.into(),
                ..TtsConfig::default()
            };
            assert!(create_tts_engine(&cfg).is_err(), "{adapter} accepted no key");
        }
    }
}
