use chardrv_core::Timeout;

use crate::primitive::{Os, RawSemaphore};

/// Bounded counting signal between interrupt and task context
///
/// The interrupt side increments the counter, the task side waits for and decrements it.
/// Each side gets a handle exposing only its own operation.
pub struct CountingSignal<O: Os> {
    raw: O::Semaphore,
    capacity: usize,
}

impl<O: Os> CountingSignal<O> {
    /// Creates an empty signal holding at most `capacity` units.
    pub fn new(capacity: usize) -> Self {
        Self {
            raw: O::create_semaphore(capacity, 0),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn count(&self) -> usize {
        self.raw.count()
    }

    pub fn split(&self) -> (IsrSignal<'_, O>, TaskSignal<'_, O>) {
        (IsrSignal(self), TaskSignal(self))
    }

    pub fn isr(&self) -> IsrSignal<'_, O> {
        IsrSignal(self)
    }

    pub fn task(&self) -> TaskSignal<'_, O> {
        TaskSignal(self)
    }
}

/// Interrupt-side handle: non-blocking increment
pub struct IsrSignal<'a, O: Os>(&'a CountingSignal<O>);

impl<'a, O: Os> IsrSignal<'a, O> {
    /// Adds one unit. Returns `false` if the signal is saturated and the unit was lost.
    pub fn give(&self) -> bool {
        self.0.raw.give_from_isr()
    }
}

impl<'a, O: Os> Clone for IsrSignal<'a, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, O: Os> Copy for IsrSignal<'a, O> {}

/// Task-side handle: blocking decrement
pub struct TaskSignal<'a, O: Os>(&'a CountingSignal<O>);

impl<'a, O: Os> TaskSignal<'a, O> {
    /// Takes one unit, waiting up to `timeout`. A timed-out call consumes nothing.
    pub fn take(&self, timeout: Timeout) -> bool {
        self.0.raw.take(timeout)
    }
}

impl<'a, O: Os> Clone for TaskSignal<'a, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, O: Os> Copy for TaskSignal<'a, O> {}
