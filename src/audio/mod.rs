//! Microphone capture and the ring buffer behind it.

pub mod capture;
pub mod ring_buffer;
pub mod vad;

pub use capture::{start_capture, MicStream, FRAME_SAMPLES, TARGET_SAMPLE_RATE};
