//! Rolling buffer of recent input levels, for waveform display.

use std::collections::VecDeque;

/// Fixed-capacity circular buffer of level samples. Pushing beyond
/// capacity evicts the oldest sample.
#[derive(Debug, Clone)]
pub struct WaveformBuffer {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl WaveformBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, level: f32) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(level.clamp(0.0, 1.0));
    }

    /// Samples oldest-first.
    pub fn levels(&self) -> Vec<f32> {
        self.samples.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
