use crate::primitive::{Os, RawLock};

/// Task-context mutual exclusion
///
/// The lock does not guard any data. It serializes whole operations, e.g. a multi-string
/// write, across tasks. It must never be taken from an interrupt handler.
pub struct TaskLock<O: Os> {
    raw: O::Lock,
}

impl<O: Os> TaskLock<O> {
    pub fn new() -> Self {
        Self {
            raw: O::create_lock(),
        }
    }

    /// Blocks until the lock is acquired. The lock is released when the guard is dropped.
    pub fn lock(&self) -> TaskLockGuard<'_, O> {
        self.raw.acquire();
        TaskLockGuard { lock: self }
    }
}

impl<O: Os> Default for TaskLock<O> {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped lock acquisition
///
/// Releases the lock on every exit path, including early return and unwinding.
#[must_use = "if unused the lock will immediately unlock"]
pub struct TaskLockGuard<'a, O: Os> {
    lock: &'a TaskLock<O>,
}

impl<'a, O: Os> Drop for TaskLockGuard<'a, O> {
    fn drop(&mut self) {
        // Safety: the guard exists only while the lock is held by this task
        unsafe { self.lock.raw.release() };
    }
}
