//! Lock-free SPSC ring buffer between the cpal callback and the listener.

use ringbuf::{
    traits::{Consumer, Observer, Producer, Split},
    HeapRb,
};

/// Default capacity: 20 seconds of 16 kHz mono audio, enough to hold a
/// full phrase while the listener is busy.
const DEFAULT_CAPACITY: usize = 320_000;

/// Producer half, lives in the cpal audio callback thread.
pub struct AudioProducer {
    inner: ringbuf::HeapProd<f32>,
}

/// Consumer half, lives with the listener.
pub struct AudioConsumer {
    inner: ringbuf::HeapCons<f32>,
}

/// Create a matched producer/consumer pair.
pub fn audio_ring_buffer(capacity: Option<usize>) -> (AudioProducer, AudioConsumer) {
    let rb = HeapRb::<f32>::new(capacity.unwrap_or(DEFAULT_CAPACITY));
    let (prod, cons) = rb.split();
    (AudioProducer { inner: prod }, AudioConsumer { inner: cons })
}

impl AudioProducer {
    /// Returns the number of samples actually written.
    pub fn push_slice(&mut self, samples: &[f32]) -> usize {
        self.inner.push_slice(samples)
    }
}

impl AudioConsumer {
    pub fn pop_slice(&mut self, buf: &mut [f32]) -> usize {
        self.inner.pop_slice(buf)
    }

    pub fn available(&self) -> usize {
        self.inner.occupied_len()
    }

    pub fn drain_all(&mut self) -> Vec<f32> {
        let mut buf = vec![0.0f32; self.available()];
        let read = self.pop_slice(&mut buf);
        buf.truncate(read);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_then_drain() {
        let (mut prod, mut cons) = audio_ring_buffer(Some(8));
        assert_eq!(prod.push_slice(&[0.1, 0.2, 0.3]), 3);
        assert_eq!(cons.available(), 3);
        assert_eq!(cons.drain_all(), vec![0.1, 0.2, 0.3]);
        assert_eq!(cons.available(), 0);
    }

    #[test]
    fn test_full_buffer_drops_overflow() {
        let (mut prod, cons) = audio_ring_buffer(Some(4));
        assert_eq!(prod.push_slice(&[0.0; 6]), 4);
        assert_eq!(cons.available(), 4);
    }
}
