//! Hosted binding of the chardrv primitive layer
//!
//! Runs the character driver on std threads: [`HostOs`] implements the primitive layer with
//! `Mutex` + `Condvar` objects, [`Task`] wraps a thread with kernel-like state reporting, and
//! [`SimUart`] stands in for the peripheral and its interrupt controller.
//!
//! Interrupt handlers are simulated by ordinary threads, so an "interrupt" may run in parallel
//! with tasks rather than preempting them. The driver protocol tolerates both: a spurious
//! transmit step that races a new transmission re-enables the interrupt it just disabled.
//!
//! # Examples
//!
//! ```
//! use std::thread;
//!
//! use chardrv_core::Timeout;
//! use chardrv_os::CountingSignal;
//! use chardrv_host::HostOs;
//!
//! let signal = CountingSignal::<HostOs>::new(4);
//! let (isr, task) = signal.split();
//!
//! thread::scope(|s| {
//!     s.spawn(move || assert!(isr.give()));
//!     assert!(task.take(Timeout::Forever));
//! });
//! assert!(!task.take(Timeout::ZERO));
//! ```

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

mod os;
mod task;
mod uart;

pub use os::{HostEventGroup, HostLock, HostOs, HostSemaphore};
pub use task::Task;
pub use uart::SimUart;
