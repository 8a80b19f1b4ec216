//! Bounded collection utilities for request samples

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Maximum number of request samples retained inside one window
pub(super) const MAX_REQUEST_SAMPLES: usize = 50_000;

/// Helper trait for bounded VecDeque operations
pub(super) trait BoundedPush<T> {
    fn push_bounded(&mut self, value: T, max_size: usize);
}

impl<T> BoundedPush<T> for VecDeque<T> {
    /// Push a value while maintaining a maximum size (O(1) amortized)
    #[inline]
    fn push_bounded(&mut self, value: T, max_size: usize) {
        if self.len() >= max_size {
            self.pop_front();
        }
        self.push_back(value);
    }
}

/// Drop samples at the front that are older than `window`
///
/// Samples must be pushed in time order.
pub(super) fn prune_older_than<T>(
    samples: &mut VecDeque<(Instant, T)>,
    window: Duration,
    now: Instant,
) {
    while let Some((at, _)) = samples.front() {
        if now.saturating_duration_since(*at) > window {
            samples.pop_front();
        } else {
            break;
        }
    }
}
