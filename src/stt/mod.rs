//! Speech-to-text.
//!
//! `whisper-local` runs whisper.cpp in-process (needs the `whisper` feature).
//! `openai-cloud` and `custom-cloud` upload WAV to an OpenAI-compatible
//! transcription endpoint.

pub mod cloud;
pub mod whisper;

use std::path::Path;

use crate::config::SttConfig;

#[allow(async_fn_in_trait)]
pub trait SttEngine: Send + Sync {
    /// 16 kHz mono samples in, text out. Empty text means nothing was said.
    async fn transcribe(&self, audio: &[f32]) -> anyhow::Result<String>;
}

/// Static dispatch over the backends, since `SttEngine` is not object safe.
pub enum SttAdapter {
    Local(whisper::WhisperStt),
    Http(cloud::HttpStt),
}

impl SttAdapter {
    pub async fn transcribe(&self, audio: &[f32]) -> anyhow::Result<String> {
        match self {
            Self::Local(e) => e.transcribe(audio).await,
            Self::Http(e) => e.transcribe(audio).await,
        }
    }
}

fn required<'a>(value: Option<&'a str>, what: &str, adapter: &str) -> anyhow::Result<&'a str> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("STT adapter {} needs {}", adapter, what))
}

pub fn create_stt_engine(config: &SttConfig, data_dir: &Path) -> anyhow::Result<SttAdapter> {
    let adapter = config.adapter.as_str();
    match adapter {
        "whisper-local" => {
            let size = config.model_size.as_deref().unwrap_or("base");
            let model = data_dir.join("models").join(format!("ggml-{}.en.bin", size));
            whisper::WhisperStt::new(&model).map(SttAdapter::Local)
        }
        "openai-cloud" => {
            let key = required(config.api_key.as_deref(), "an API key", adapter)?;
            Ok(SttAdapter::Http(cloud::HttpStt::openai(key)))
        }
        "custom-cloud" => {
            let url = required(config.endpoint.as_deref(), "an endpoint URL", adapter)?;
            Ok(SttAdapter::Http(cloud::HttpStt::new(url, config.api_key.clone())))
        }
        other => anyhow::bail!("Unknown STT adapter: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(adapter: &str) -> SttConfig {
        SttConfig {
            adapter: adapter.into(),
            ..SttConfig::default()
        }
    }

    #[test]
    fn test_cloud_adapter_requires_key() {
        let err = create_stt_engine(&config("openai-cloud"), Path::new("."))
            .err()
            .unwrap();
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn test_custom_endpoint_is_used() {
        let mut cfg = config("custom-cloud");
        cfg.endpoint = Some("http://localhost:9000/v1/audio/transcriptions".into());
        match create_stt_engine(&cfg, Path::new(".")).unwrap() {
            SttAdapter::Http(stt) => {
                assert_eq!(stt.url(), "http://localhost:9000/v1/audio/transcriptions")
            }
            SttAdapter::Local(_) => panic!("expected the HTTP adapter"),
        }
    }

    #[test]
    fn test_missing_local_model_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(create_stt_engine(&config("whisper-local"), dir.path()).is_err());
    }

    #[test]
    fn test_unknown_adapter_rejected() {
        let err = create_stt_engine(&config("carrier-pigeon"), Path::new("."))
            .err()
            .unwrap();
        assert!(err.to_string().contains("carrier-pigeon"));
    }
}
