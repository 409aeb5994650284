//! Fixed-capacity history of the most recent mono samples.

/// Ring buffer written by the audio callback and read by the analysis taps
#[derive(Debug, Clone)]
pub struct SampleRing {
    buffer: Vec<f32>,
    /// Next write position
    head: usize,
    /// Samples written so far, saturating at capacity
    filled: usize,
}

impl SampleRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(1)],
            head: 0,
            filled: 0,
        }
    }

    /// Append samples, overwriting the oldest once full
    pub fn push(&mut self, samples: &[f32]) {
        let capacity = self.buffer.len();
        // Only the tail can survive
        let samples = &samples[samples.len().saturating_sub(capacity)..];
        for &sample in samples {
            self.buffer[self.head] = sample;
            self.head = (self.head + 1) % capacity;
        }
        self.filled = (self.filled + samples.len()).min(capacity);
    }

    /// Copy the latest `out.len()` samples in chronological order.
    ///
    /// When fewer samples are available the front of `out` is zero-filled.
    pub fn copy_latest(&self, out: &mut [f32]) {
        let capacity = self.buffer.len();
        let available = self.filled.min(out.len());
        let padding = out.len() - available;
        out[..padding].fill(0.0);

        let start = (self.head + capacity - available) % capacity;
        for (i, slot) in out[padding..].iter_mut().enumerate() {
            *slot = self.buffer[(start + i) % capacity];
        }
    }
}
