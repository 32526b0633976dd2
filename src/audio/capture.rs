//! Microphone capture via cpal.
//!
//! Opens the default (or named) input device at its native rate, down-mixes
//! to mono, resamples to 16 kHz and pushes fixed-size frames into a ring
//! buffer. The listener pulls frames out at its own pace.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use tracing::{error, info};

use super::ring_buffer::{audio_ring_buffer, AudioConsumer};

/// Sample rate expected by every STT engine.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Frame size in samples (30 ms at 16 kHz).
pub const FRAME_SAMPLES: usize = 480;

/// List available input device names.
pub fn list_devices() -> Vec<String> {
    let host = cpal::default_host();
    host.input_devices()
        .map(|devices| devices.filter_map(|d| d.name().ok()).collect())
        .unwrap_or_default()
}

/// An open input stream and the consumer end of its buffer. Dropping it
/// stops capture.
pub struct MicStream {
    _stream: Stream,
    consumer: AudioConsumer,
}

impl MicStream {
    /// Pop one full frame if available.
    pub fn next_frame(&mut self) -> Option<Vec<f32>> {
        if self.consumer.available() < FRAME_SAMPLES {
            return None;
        }
        let mut frame = vec![0.0f32; FRAME_SAMPLES];
        let read = self.consumer.pop_slice(&mut frame);
        frame.truncate(read);
        Some(frame)
    }

    /// Throw away everything buffered so far (e.g. our own voice).
    pub fn discard_pending(&mut self) {
        let _ = self.consumer.drain_all();
    }
}

fn resolve_device(device_name: Option<&str>) -> anyhow::Result<cpal::Device> {
    let host = cpal::default_host();
    let device = match device_name {
        Some(name) => host
            .input_devices()
            .map_err(|e| anyhow::anyhow!("Failed to enumerate input devices: {e}"))?
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Input device not found: {name} (available: {})",
                    list_devices().join(", ")
                )
            })?,
        None => host
            .default_input_device()
            .ok_or_else(|| anyhow::anyhow!("No default input device available"))?,
    };
    info!(device = %device.name().unwrap_or_else(|_| "unknown".into()), "Selected input device");
    Ok(device)
}

/// Simple linear resampler from `from_rate` to `to_rate` (mono).
pub(crate) fn resample_linear(input: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate {
        return input.to_vec();
    }
    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = ((input.len() as f64) / ratio).floor() as usize;
    (0..out_len)
        .map(|i| {
            let src = i as f64 * ratio;
            let idx = src.floor() as usize;
            let frac = (src - idx as f64) as f32;
            let s0 = input.get(idx).copied().unwrap_or(0.0);
            let s1 = input.get(idx + 1).copied().unwrap_or(s0);
            s0 + frac * (s1 - s0)
        })
        .collect()
}

/// Down-mix interleaved multi-channel audio to mono by averaging.
pub(crate) fn to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let ch = channels as usize;
    samples
        .chunks_exact(ch)
        .map(|frame| frame.iter().sum::<f32>() / ch as f32)
        .collect()
}

/// Open the input device and start streaming 16 kHz mono frames.
pub fn start_capture(device_name: Option<&str>) -> anyhow::Result<MicStream> {
    let device = resolve_device(device_name)?;
    let default_config = device
        .default_input_config()
        .map_err(|e| anyhow::anyhow!("Failed to get default input config: {e}"))?;

    let native_rate = default_config.sample_rate().0;
    let channels = default_config.channels();
    let stream_config = StreamConfig {
        channels,
        sample_rate: cpal::SampleRate(native_rate),
        buffer_size: cpal::BufferSize::Default,
    };
    info!(native_rate, channels, "Input device config");

    let (mut producer, consumer) = audio_ring_buffer(None);

    let stream = device
        .build_input_stream(
            &stream_config,
            move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                let mono = to_mono(data, channels);
                let resampled = resample_linear(&mono, native_rate, TARGET_SAMPLE_RATE);
                // A full buffer drops the newest audio; the listener drains
                // fast enough that this only happens while we are speaking.
                producer.push_slice(&resampled);
            },
            move |err| {
                error!("Audio input stream error: {}", err);
            },
            None,
        )
        .map_err(|e| anyhow::anyhow!("Failed to build input stream: {e}"))?;

    stream
        .play()
        .map_err(|e| anyhow::anyhow!("Failed to start input stream: {e}"))?;
    info!("Audio capture started");

    Ok(MicStream {
        _stream: stream,
        consumer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_mono_averages_channels() {
        let stereo = [1.0, 0.0, 0.5, 0.5];
        assert_eq!(to_mono(&stereo, 2), vec![0.5, 0.5]);
        assert_eq!(to_mono(&stereo, 1), stereo.to_vec());
    }

    #[test]
    fn test_resample_halves_length() {
        let input: Vec<f32> = (0..320).map(|i| i as f32).collect();
        let out = resample_linear(&input, 32_000, 16_000);
        assert_eq!(out.len(), 160);
        assert_eq!(out[1], 2.0);
    }

    #[test]
    fn test_resample_same_rate_is_identity() {
        let input = vec![0.1, 0.2, 0.3];
        assert_eq!(resample_linear(&input, 16_000, 16_000), input);
    }
}
