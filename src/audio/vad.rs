//! Energy-based voice activity detection and phrase endpointing.

use std::time::Duration;

use super::capture::{FRAME_SAMPLES, TARGET_SAMPLE_RATE};

/// Mean absolute amplitude of a chunk.
pub fn energy(chunk: &[f32]) -> f32 {
    if chunk.is_empty() {
        return 0.0;
    }
    chunk.iter().map(|s| s.abs()).sum::<f32>() / chunk.len() as f32
}

/// What the endpointer concluded after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// No speech yet, still inside the listen window.
    Waiting,
    /// Speech in progress.
    Recording,
    /// Listen window elapsed with no speech.
    TimedOut,
    /// Phrase finished (trailing silence or phrase limit).
    Complete,
}

/// Frame-counting endpointer: waits for speech onset within the listen
/// window, then records until enough trailing silence or the phrase limit.
#[derive(Debug)]
pub struct Endpointer {
    threshold: f32,
    listen_frames: usize,
    phrase_frames: usize,
    pause_frames: usize,
    waited: usize,
    recorded: usize,
    silent_run: usize,
    started: bool,
    audio: Vec<f32>,
}

fn frames_in(d: Duration) -> usize {
    let frame_ms = (FRAME_SAMPLES as u128 * 1000) / TARGET_SAMPLE_RATE as u128;
    (d.as_millis().div_ceil(frame_ms) as usize).max(1)
}

impl Endpointer {
    pub fn new(threshold: f32, listen: Duration, phrase_limit: Duration, pause: Duration) -> Self {
        Self {
            threshold,
            listen_frames: frames_in(listen),
            phrase_frames: frames_in(phrase_limit),
            pause_frames: frames_in(pause),
            waited: 0,
            recorded: 0,
            silent_run: 0,
            started: false,
            audio: Vec::new(),
        }
    }

    pub fn push(&mut self, frame: &[f32]) -> Endpoint {
        let loud = energy(frame) >= self.threshold;

        if !self.started {
            if !loud {
                self.waited += 1;
                return if self.waited >= self.listen_frames {
                    Endpoint::TimedOut
                } else {
                    Endpoint::Waiting
                };
            }
            self.started = true;
        }

        self.audio.extend_from_slice(frame);
        self.recorded += 1;
        self.silent_run = if loud { 0 } else { self.silent_run + 1 };

        if self.silent_run >= self.pause_frames || self.recorded >= self.phrase_frames {
            Endpoint::Complete
        } else {
            Endpoint::Recording
        }
    }

    pub fn into_audio(self) -> Vec<f32> {
        self.audio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loud() -> Vec<f32> {
        vec![0.2; FRAME_SAMPLES]
    }

    fn quiet() -> Vec<f32> {
        vec![0.0; FRAME_SAMPLES]
    }

    #[test]
    fn test_energy() {
        assert_eq!(energy(&[]), 0.0);
        assert!((energy(&[0.5, -0.5]) - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_times_out_without_speech() {
        let mut ep = Endpointer::new(
            0.01,
            Duration::from_millis(90),
            Duration::from_secs(15),
            Duration::from_secs(1),
        );
        assert_eq!(ep.push(&quiet()), Endpoint::Waiting);
        assert_eq!(ep.push(&quiet()), Endpoint::Waiting);
        assert_eq!(ep.push(&quiet()), Endpoint::TimedOut);
    }

    #[test]
    fn test_completes_after_trailing_silence() {
        let mut ep = Endpointer::new(
            0.01,
            Duration::from_secs(10),
            Duration::from_secs(15),
            Duration::from_millis(60),
        );
        assert_eq!(ep.push(&quiet()), Endpoint::Waiting);
        assert_eq!(ep.push(&loud()), Endpoint::Recording);
        assert_eq!(ep.push(&quiet()), Endpoint::Recording);
        assert_eq!(ep.push(&quiet()), Endpoint::Complete);
        // leading silence is not part of the phrase
        assert_eq!(ep.into_audio().len(), FRAME_SAMPLES * 3);
    }

    #[test]
    fn test_phrase_limit_cuts_long_speech() {
        let mut ep = Endpointer::new(
            0.01,
            Duration::from_secs(10),
            Duration::from_millis(90),
            Duration::from_secs(1),
        );
        assert_eq!(ep.push(&loud()), Endpoint::Recording);
        assert_eq!(ep.push(&loud()), Endpoint::Recording);
        assert_eq!(ep.push(&loud()), Endpoint::Complete);
    }
}
