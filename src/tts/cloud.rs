//! Hosted speech synthesis: OpenAI and ElevenLabs.

use std::time::Duration;

use tracing::debug;

use super::{mp3, SpeakFuture, SpeechAudio, TtsEngine};

const OPENAI_SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";
const ELEVENLABS_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";

/// OpenAI `pcm` responses are 24 kHz 16-bit mono.
const OPENAI_PCM_RATE: u32 = 24_000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Little-endian i16 PCM bytes to f32 samples.
pub(crate) fn pcm16_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|c| i16::from_le_bytes([c[0], c[1]]) as f32 / 32768.0)
        .collect()
}

fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Send a synthesis request and return the raw audio body.
async fn fetch_audio(req: reqwest::RequestBuilder, service: &str) -> anyhow::Result<Vec<u8>> {
    let resp = req
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("{} request failed: {}", service, e))?;
    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("{} error {}: {}", service, status, body);
    }
    let bytes = resp.bytes().await?;
    debug!(service, bytes = bytes.len(), "Synthesis response");
    Ok(bytes.to_vec())
}

/// OpenAI speech endpoint with `response_format: pcm`, so the reply plays
/// without decoding.
pub struct OpenAiTts {
    api_key: String,
    voice: String,
    client: reqwest::Client,
}

impl OpenAiTts {
    pub fn new(api_key: &str, voice: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            voice: voice.to_string(),
            client: http_client(),
        }
    }
}

impl TtsEngine for OpenAiTts {
    fn speak(&self, text: &str) -> SpeakFuture<'_> {
        let body = serde_json::json!({
            "model": "tts-1",
            "input": text,
            "voice": self.voice,
            "response_format": "pcm",
        });
        Box::pin(async move {
            let req = self
                .client
                .post(OPENAI_SPEECH_URL)
                .bearer_auth(&self.api_key)
                .json(&body);
            let bytes = fetch_audio(req, "OpenAI TTS").await?;
            Ok(SpeechAudio {
                samples: pcm16_to_f32(&bytes),
                sample_rate: OPENAI_PCM_RATE,
            })
        })
    }

    fn name(&self) -> String {
        format!("OpenAI TTS ({})", self.voice)
    }
}

/// ElevenLabs text-to-speech. Replies are mp3, decoded off the runtime.
pub struct ElevenLabsTts {
    api_key: String,
    voice_id: String,
    client: reqwest::Client,
}

impl ElevenLabsTts {
    pub fn new(api_key: &str, voice_id: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            voice_id: voice_id.to_string(),
            client: http_client(),
        }
    }
}

impl TtsEngine for ElevenLabsTts {
    fn speak(&self, text: &str) -> SpeakFuture<'_> {
        let body = serde_json::json!({
            "text": text,
            "model_id": "eleven_turbo_v2",
            "voice_settings": { "stability": 0.5, "similarity_boost": 0.5 },
        });
        Box::pin(async move {
            let req = self
                .client
                .post(format!("{}/{}", ELEVENLABS_URL, self.voice_id))
                .header("xi-api-key", &self.api_key)
                .header("Accept", "audio/mpeg")
                .json(&body);
            let bytes = fetch_audio(req, "ElevenLabs").await?;
            tokio::task::spawn_blocking(move || mp3::decode_mp3(bytes))
                .await
                .map_err(|e| anyhow::anyhow!("MP3 decode task failed: {}", e))?
        })
    }

    fn name(&self) -> String {
        format!("ElevenLabs ({})", self.voice_id)
    }
}
