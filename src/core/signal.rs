//! Single-assignment abort flag.

use std::sync::atomic::{AtomicBool, Ordering};

/// A flag that can be raised any number of times but only transitions once.
///
/// Raising it never blocks and needs no listener, so there is no handoff that can
/// be left waiting for a receiver.
///
/// ```
/// use prometheus_job_runner::AbortSignal;
///
/// let signal = AbortSignal::new();
/// assert!(signal.trip());
/// assert!(!signal.trip());
/// assert!(signal.is_tripped());
/// ```
#[derive(Debug, Default)]
pub struct AbortSignal {
    tripped: AtomicBool,
}

impl AbortSignal {
    /// Create an untripped signal.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tripped: AtomicBool::new(false),
        }
    }

    /// Raise the flag. Returns `true` only for the call that raised it.
    pub fn trip(&self) -> bool {
        !self.tripped.swap(true, Ordering::AcqRel)
    }

    /// Whether the flag has been raised.
    #[must_use]
    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::Acquire)
    }
}
