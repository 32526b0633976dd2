//! Hosted transcription over an OpenAI-compatible `/audio/transcriptions`
//! endpoint: OpenAI itself or a user-supplied server.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::debug;

use super::SttEngine;
use crate::audio::TARGET_SAMPLE_RATE;

const OPENAI_TRANSCRIPTIONS_URL: &str = "https://api.openai.com/v1/audio/transcriptions";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// 44-byte canonical header for 16-bit mono PCM.
fn wav_header(sample_rate: u32, data_len: u32) -> [u8; 44] {
    let mut h = [0u8; 44];
    let fields: [(usize, &[u8]); 13] = [
        (0, b"RIFF"),
        (4, &(36 + data_len).to_le_bytes()),
        (8, b"WAVE"),
        (12, b"fmt "),
        (16, &16u32.to_le_bytes()),
        (20, &1u16.to_le_bytes()),
        (22, &1u16.to_le_bytes()),
        (24, &sample_rate.to_le_bytes()),
        (28, &(sample_rate * 2).to_le_bytes()),
        (32, &2u16.to_le_bytes()),
        (34, &16u16.to_le_bytes()),
        (36, b"data"),
        (40, &data_len.to_le_bytes()),
    ];
    for (at, bytes) in fields {
        h[at..at + bytes.len()].copy_from_slice(bytes);
    }
    h
}

/// Wrap f32 samples in a WAV container for upload.
pub(crate) fn encode_wav(audio: &[f32], sample_rate: u32) -> Vec<u8> {
    let pcm: Vec<u8> = audio
        .iter()
        .flat_map(|s| ((s.clamp(-1.0, 1.0) * 32767.0) as i16).to_le_bytes())
        .collect();
    let mut wav = wav_header(sample_rate, pcm.len() as u32).to_vec();
    wav.extend(pcm);
    wav
}

#[derive(Deserialize)]
struct Transcription {
    #[serde(default)]
    text: String,
}

pub struct HttpStt {
    url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpStt {
    pub fn new(url: &str, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            url: url.to_string(),
            api_key,
            client,
        }
    }

    pub fn openai(api_key: &str) -> Self {
        Self::new(OPENAI_TRANSCRIPTIONS_URL, Some(api_key.to_string()))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl SttEngine for HttpStt {
    async fn transcribe(&self, audio: &[f32]) -> anyhow::Result<String> {
        let wav = encode_wav(audio, TARGET_SAMPLE_RATE);
        debug!(bytes = wav.len(), url = %self.url, "Uploading audio for transcription");

        let form = Form::new()
            .text("model", "whisper-1")
            .text("language", "en")
            .part("file", Part::bytes(wav).file_name("audio.wav").mime_str("audio/wav")?);
        let mut req = self.client.post(&self.url).multipart(form);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Transcription failed ({}): {}", status, body);
        }
        let reply: Transcription = resp.json().await?;
        Ok(reply.text)
    }
}
