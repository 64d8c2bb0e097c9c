//! Completion latch for a batch of jobs.
//!
//! The latch starts at the batch size and is counted down once per job, whether the
//! job ran to completion or was skipped. Waiting parks on a `Condvar`; nothing polls.

use parking_lot::{Condvar, Mutex};

/// Count-down latch released when every job in a batch is accounted for.
#[derive(Debug)]
pub struct CompletionLatch {
    remaining: Mutex<usize>,
    settled: Condvar,
}

impl CompletionLatch {
    /// Create a latch expecting `count` count-downs.
    #[must_use]
    pub fn new(count: usize) -> Self {
        Self {
            remaining: Mutex::new(count),
            settled: Condvar::new(),
        }
    }

    /// Account for one job. Extra count-downs past zero are ignored.
    pub fn count_down(&self) {
        let mut remaining = self.remaining.lock();
        if *remaining == 0 {
            return;
        }
        *remaining -= 1;
        if *remaining == 0 {
            self.settled.notify_all();
        }
    }

    /// Block until the count reaches zero.
    pub fn wait(&self) {
        let mut remaining = self.remaining.lock();
        self.settled.wait_while(&mut remaining, |left| *left > 0);
    }

    /// Jobs not yet accounted for.
    #[must_use]
    pub fn remaining(&self) -> usize {
        *self.remaining.lock()
    }
}
