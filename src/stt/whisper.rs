//! Offline transcription with whisper.cpp.
//!
//! Needs the `whisper` feature; without it the adapter refuses to start and
//! `create_stt_engine` reports why. Models live at
//! `<data_dir>/models/ggml-<size>.en.bin`.

#[cfg(feature = "whisper")]
mod local {
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use tracing::{debug, info};
    use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

    use crate::stt::SttEngine;

    /// Under 0.4 s of 16 kHz audio is a click or a breath.
    const MIN_SAMPLES: usize = 6_400;

    pub struct WhisperStt {
        ctx: Arc<Mutex<WhisperContext>>,
        threads: i32,
    }

    impl WhisperStt {
        pub fn new(model_path: &Path) -> anyhow::Result<Self> {
            let path = model_path
                .to_str()
                .filter(|_| model_path.exists())
                .ok_or_else(|| anyhow::anyhow!("No whisper model at {}", model_path.display()))?;
            let ctx = WhisperContext::new_with_params(path, WhisperContextParameters::default())
                .map_err(|e| anyhow::anyhow!("Loading whisper model failed: {}", e))?;
            let cores = std::thread::available_parallelism().map_or(4, |n| n.get());
            let threads = (cores / 2).clamp(1, 8) as i32;
            info!(model = %model_path.display(), threads, "Whisper model loaded");
            Ok(Self {
                ctx: Arc::new(Mutex::new(ctx)),
                threads,
            })
        }
    }

    /// One greedy, English, single-segment pass.
    fn infer(ctx: &WhisperContext, audio: &[f32], threads: i32) -> anyhow::Result<String> {
        let mut state = ctx
            .create_state()
            .map_err(|e| anyhow::anyhow!("whisper state: {}", e))?;
        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(Some("en"));
        params.set_n_threads(threads);
        params.set_single_segment(true);
        params.set_no_timestamps(true);
        params.set_suppress_non_speech_tokens(true);
        params.set_print_progress(false);
        params.set_print_realtime(false);

        state
            .full(params, audio)
            .map_err(|e| anyhow::anyhow!("whisper inference: {}", e))?;
        let segments = state
            .full_n_segments()
            .map_err(|e| anyhow::anyhow!("whisper segments: {}", e))?;
        let words: Vec<String> = (0..segments)
            .filter_map(|i| state.full_get_segment_text(i).ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Ok(words.join(" "))
    }

    impl SttEngine for WhisperStt {
        async fn transcribe(&self, audio: &[f32]) -> anyhow::Result<String> {
            if audio.len() < MIN_SAMPLES {
                debug!(samples = audio.len(), "Too short to transcribe");
                return Ok(String::new());
            }
            let audio = audio.to_vec();
            let ctx = Arc::clone(&self.ctx);
            let threads = self.threads;
            tokio::task::spawn_blocking(move || {
                let ctx = ctx
                    .lock()
                    .map_err(|_| anyhow::anyhow!("whisper context poisoned"))?;
                infer(&ctx, &audio, threads)
            })
            .await?
        }
    }
}

#[cfg(not(feature = "whisper"))]
mod local {
    use std::path::Path;

    use crate::stt::SttEngine;

    const UNAVAILABLE: &str = "this build has no local whisper support (enable the `whisper` feature)";

    pub struct WhisperStt;

    impl WhisperStt {
        pub fn new(model_path: &Path) -> anyhow::Result<Self> {
            anyhow::bail!("Cannot load {}: {}", model_path.display(), UNAVAILABLE)
        }
    }

    impl SttEngine for WhisperStt {
        async fn transcribe(&self, _audio: &[f32]) -> anyhow::Result<String> {
            anyhow::bail!("{}", UNAVAILABLE)
        }
    }
}

pub use local::WhisperStt;
