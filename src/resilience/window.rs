//! Rolling outcome window.
//!
//! Fixed-capacity FIFO of the most recent call samples. Counters are kept
//! alongside the buffer so the failure ratio is O(1).

use std::collections::VecDeque;

/// Reduced result of a forwarded call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sample {
    Success,
    Failure,
    Timeout,
}

impl Sample {
    pub fn is_failure(self) -> bool {
        !matches!(self, Sample::Success)
    }
}

#[derive(Debug, Clone)]
pub struct RollingWindow {
    samples: VecDeque<Sample>,
    capacity: usize,
    failures: usize,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            failures: 0,
        }
    }

    /// Append a sample, evicting the oldest one when full.
    pub fn push(&mut self, sample: Sample) {
        if self.samples.len() == self.capacity {
            if let Some(evicted) = self.samples.pop_front() {
                if evicted.is_failure() {
                    self.failures -= 1;
                }
            }
        }
        if sample.is_failure() {
            self.failures += 1;
        }
        self.samples.push_back(sample);
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.failures = 0;
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Failures and timeouts currently in the window.
    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn timeouts(&self) -> usize {
        self.samples.iter().filter(|s| **s == Sample::Timeout).count()
    }

    /// Failure ratio in percent, 0 for an empty window.
    pub fn failure_percent(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.failures as f64 * 100.0 / self.samples.len() as f64
    }

    /// True when at least `min_samples` are present, at least one of them
    /// failed, and the failure ratio reaches `threshold_percent`.
    pub fn exceeds(&self, threshold_percent: u8, min_samples: usize) -> bool {
        self.samples.len() >= min_samples
            && self.failures > 0
            && self.failures * 100 >= usize::from(threshold_percent) * self.samples.len()
    }
}
