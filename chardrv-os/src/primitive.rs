use chardrv_core::{EventBits, Timeout};
use embassy_time::Duration;

/// Mutual-exclusion lock
///
/// Task context only. Implementations may apply priority inheritance.
pub trait RawLock {
    /// Blocks until the lock is acquired.
    fn acquire(&self);

    /// Releases the lock.
    ///
    /// # Safety
    ///
    /// The calling task must hold the lock.
    unsafe fn release(&self);
}

/// Bounded counting semaphore
pub trait RawSemaphore {
    /// Decrements the count, blocking up to `timeout` while it is zero.
    ///
    /// Returns `false` on timeout; the count is left untouched in that case.
    fn take(&self, timeout: Timeout) -> bool;

    /// Increments the count without blocking. Safe to call from an interrupt handler.
    ///
    /// Returns `false` if the count is already at its maximum.
    fn give_from_isr(&self) -> bool;

    fn count(&self) -> usize;
}

/// Options of [`RawEventGroup::wait`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WaitOptions {
    /// Clear the awaited bits before returning successfully
    pub clear_on_exit: bool,
    /// Wait for all awaited bits instead of any of them
    pub wait_for_all: bool,
}

/// Event-bit group
pub trait RawEventGroup {
    fn set(&self, bits: EventBits);

    /// Sets bits without blocking. Safe to call from an interrupt handler.
    fn set_from_isr(&self, bits: EventBits);

    fn clear(&self, bits: EventBits);

    fn get(&self) -> EventBits;

    /// Blocks up to `timeout` until the awaited `bits` are set.
    ///
    /// Returns the group value that satisfied the condition (sampled before the optional
    /// clear), or `None` on timeout.
    fn wait(&self, bits: EventBits, options: WaitOptions, timeout: Timeout) -> Option<EventBits>;
}

/// Task state as reported by the kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskState {
    Ready,
    Running,
    Blocked,
    Suspended,
    Deleted,
}

/// RTOS binding
///
/// Object deletion maps to `Drop` of the associated types. Kernel objects are shared between
/// tasks and interrupt handlers, so every object type must be `Send + Sync`.
pub trait Os {
    type Lock: RawLock + Send + Sync;
    type Semaphore: RawSemaphore + Send + Sync;
    type EventGroup: RawEventGroup + Send + Sync;

    fn create_lock() -> Self::Lock;

    /// Creates a semaphore with count limited to `max_count`.
    fn create_semaphore(max_count: usize, initial_count: usize) -> Self::Semaphore;

    fn create_event_group() -> Self::EventGroup;

    /// Blocks the calling task for `duration`.
    fn delay(duration: Duration);
}
