//! Counting gate that bounds how many jobs execute at once.
//!
//! Waiters park on a `parking_lot::Condvar` until a slot is handed back; there is
//! no spinning. Slots are returned by dropping the [`GatePermit`], so a job that
//! panics still releases its slot while unwinding.

use parking_lot::{Condvar, Mutex};

use super::RunnerError;

/// Bounds the number of concurrently held permits to a fixed capacity.
///
/// # Examples
///
/// ```
/// use prometheus_job_runner::ConcurrencyGate;
///
/// let gate = ConcurrencyGate::new(2).unwrap();
/// let first = gate.acquire();
/// let second = gate.acquire();
/// assert!(gate.try_acquire().is_none());
///
/// drop(first);
/// assert_eq!(gate.available(), 1);
/// drop(second);
/// assert_eq!(gate.available(), 2);
/// ```
#[derive(Debug)]
pub struct ConcurrencyGate {
    capacity: usize,
    /// Free slots.
    available: Mutex<usize>,
    released: Condvar,
}

impl ConcurrencyGate {
    /// Create a gate with `capacity` slots.
    ///
    /// # Errors
    ///
    /// Returns `RunnerError::InvalidConfig` when `capacity` is zero, since such a
    /// gate could never admit a job.
    pub fn new(capacity: usize) -> Result<Self, RunnerError> {
        if capacity == 0 {
            return Err(RunnerError::InvalidConfig(
                "max_concurrency must be greater than 0".into(),
            ));
        }
        Ok(Self {
            capacity,
            available: Mutex::new(capacity),
            released: Condvar::new(),
        })
    }

    /// Block until a slot is free and take it.
    pub fn acquire(&self) -> GatePermit<'_> {
        let mut available = self.available.lock();
        self.released.wait_while(&mut available, |free| *free == 0);
        *available -= 1;
        GatePermit { gate: self }
    }

    /// Take a slot if one is free right now.
    pub fn try_acquire(&self) -> Option<GatePermit<'_>> {
        let mut available = self.available.lock();
        if *available == 0 {
            return None;
        }
        *available -= 1;
        Some(GatePermit { gate: self })
    }

    /// Total number of slots.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots free at the moment of the call.
    #[must_use]
    pub fn available(&self) -> usize {
        *self.available.lock()
    }

    fn release(&self) {
        {
            let mut available = self.available.lock();
            debug_assert!(*available < self.capacity, "gate released more than acquired");
            *available += 1;
        }
        self.released.notify_one();
    }
}

/// A held gate slot. Dropping it frees the slot and wakes at most one waiter.
#[derive(Debug)]
#[must_use = "dropping the permit immediately releases the slot"]
pub struct GatePermit<'a> {
    gate: &'a ConcurrencyGate,
}

impl Drop for GatePermit<'_> {
    fn drop(&mut self) {
        self.gate.release();
    }
}
