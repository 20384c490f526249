//! Majority-vote smoothing of per-frame identities.

use crate::types::Identity;
use std::collections::VecDeque;

/// Fixed-capacity FIFO of recent raw identities.
///
/// Each push returns the mode of the current window; ties go to the value
/// that appears first scanning oldest to newest.
#[derive(Debug, Clone)]
pub struct TemporalSmoother {
    history: VecDeque<Identity>,
    capacity: usize,
}

impl Default for TemporalSmoother {
    fn default() -> Self {
        Self::new(crate::DEFAULT_WINDOW)
    }
}

impl TemporalSmoother {
    /// A capacity of zero is treated as one (no smoothing).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// Append a raw identity, evicting the oldest if full, and return the smoothed identity.
    pub fn push(&mut self, raw: Identity) -> Identity {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(raw);
        self.mode()
    }

    /// Most frequent identity in the window. Linear scan; the window is tiny.
    fn mode(&self) -> Identity {
        let mut best: Option<(&Identity, usize)> = None;

        for (i, candidate) in self.history.iter().enumerate() {
            // Only count a value at its first occurrence.
            if self.history.iter().take(i).any(|earlier| earlier == candidate) {
                continue;
            }
            let count = self.history.iter().filter(|&v| v == candidate).count();
            if best.map_or(true, |(_, best_count)| count > best_count) {
                best = Some((candidate, count));
            }
        }

        best.map(|(identity, _)| identity.clone())
            .unwrap_or(Identity::NoFace)
    }
}
