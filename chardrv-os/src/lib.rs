//! Character driver primitive layer
//!
//! The crate defines the interface between the character driver and the underlying RTOS.
//! Platform crates implement [`Os`]; the driver and its users only consume it.
//! Limited scope facilitates porting to a new kernel.
//!
//! The layer consists of:
//! * _Raw objects_: a mutual-exclusion lock, a bounded counting semaphore and an event-bit group,
//!   created and destroyed through [`Os`]. A raw object is released by its `Drop`.
//! * _Wrappers_ built once on top of any [`Os`]: [`TaskLock`], [`CountingSignal`],
//!   [`Completion`], [`Flag`] and [`wait_until`].
//! * _Serial hooks_: the interrupt enable/disable lines and the byte sender of a UART-class
//!   peripheral, see [`SerialHooks`].
//!
//! ## Execution contexts
//!
//! Raw object methods are split by context. Methods with the `_from_isr` suffix never block and
//! may be called from an interrupt handler. All other methods may block and must be called from
//! a task. The wrappers turn this convention into types where possible: [`CountingSignal`] hands
//! out an [`IsrSignal`] that can only give and a [`TaskSignal`] that can only take.

#![no_std]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

mod event;
mod hooks;
mod lock;
mod poll;
mod primitive;
mod signal;

pub use chardrv_core::{EventBits, Timeout};
pub use event::{Completion, Flag};
pub use hooks::{FnHooks, SerialHooks};
pub use lock::{TaskLock, TaskLockGuard};
pub use poll::wait_until;
pub use primitive::{Os, RawEventGroup, RawLock, RawSemaphore, TaskState, WaitOptions};
pub use signal::{CountingSignal, IsrSignal, TaskSignal};

pub mod time {
    pub use embassy_time::Duration;
}
