//! Audio playback via rodio.
//!
//! Plays mono f32 PCM through the default output device. The player is not
//! `Send` (the output stream is tied to its thread), so it lives on the
//! speech worker thread.

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink};

use super::SpeechAudio;

pub struct AudioPlayer {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    volume: f32,
}

impl AudioPlayer {
    /// Open the default audio output device.
    pub fn new(volume: f32) -> anyhow::Result<Self> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| anyhow::anyhow!("Failed to open audio output: {}", e))?;
        Ok(Self {
            _stream: stream,
            handle,
            volume: volume.clamp(0.0, 1.0),
        })
    }

    /// Play speech audio, blocking until it finishes.
    pub fn play(&self, audio: &SpeechAudio) -> anyhow::Result<()> {
        if audio.is_empty() {
            return Ok(());
        }
        let sink = Sink::try_new(&self.handle)
            .map_err(|e| anyhow::anyhow!("Failed to create audio sink: {}", e))?;
        sink.set_volume(self.volume);
        sink.append(SamplesBuffer::new(1, audio.sample_rate, audio.samples.clone()));
        sink.sleep_until_end();
        Ok(())
    }
}
