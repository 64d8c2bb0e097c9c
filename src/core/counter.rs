//! Shared failure tally.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Race-free count of failed jobs.
///
/// Writes are `Release` increments and reads are `Acquire` loads, so a read never
/// observes fewer failures than the `record_failure` calls that have already returned.
/// The count never decreases.
#[derive(Debug, Default)]
pub struct FailureCounter {
    failures: AtomicUsize,
}

impl FailureCounter {
    /// Create a counter at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            failures: AtomicUsize::new(0),
        }
    }

    /// Count one failure and return the new total.
    pub fn record_failure(&self) -> usize {
        self.failures.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Failures recorded so far.
    #[must_use]
    pub fn current_count(&self) -> usize {
        self.failures.load(Ordering::Acquire)
    }

    /// Whether failures strictly exceed `max_errors`.
    #[must_use]
    pub fn exceeds(&self, max_errors: usize) -> bool {
        self.current_count() > max_errors
    }
}
