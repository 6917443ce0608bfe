use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Poll-based progress for batch operations. The core increments the
/// counter as items complete; a UI or progress bar reads it whenever it
/// likes. No callbacks.
pub struct BatchProgress {
    pub total: usize,
    completed: AtomicUsize,
    start_time: Instant,
}

impl BatchProgress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    /// Increment completed count and return current count
    pub fn increment(&self) -> usize {
        self.completed.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    /// Get current progress (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            (self.completed() as f64) / (self.total as f64)
        }
    }

    /// Get estimated time remaining
    pub fn eta(&self) -> Option<Duration> {
        let completed = self.completed();
        if completed == 0 {
            return None;
        }

        let remaining = self.total.saturating_sub(completed);
        if remaining == 0 {
            return Some(Duration::new(0, 0));
        }

        let time_per_item = self.start_time.elapsed() / completed as u32;
        Some(time_per_item * remaining as u32)
    }
}
