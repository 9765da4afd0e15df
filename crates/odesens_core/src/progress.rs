//! Shared progress counter for an analysis run.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts evaluated sample rows.
///
/// Clones share the same counters, so a clone can be polled from another
/// thread (e.g. a UI) while the analysis runs.
#[derive(Debug, Clone)]
pub struct AnalysisProgress {
    completed: Arc<AtomicUsize>,
    total: Arc<AtomicUsize>,
}

impl AnalysisProgress {
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            completed: Arc::new(AtomicUsize::new(0)),
            total: Arc::new(AtomicUsize::new(total)),
        }
    }

    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    /// Completed fraction in [0, 1]; 0 when the total is unknown
    #[must_use]
    pub fn fraction(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.completed() as f64 / total as f64,
        }
    }

    pub fn increment(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reset(&self, total: usize) {
        self.completed.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }
}

impl Default for AnalysisProgress {
    fn default() -> Self {
        Self::new(0)
    }
}
