//! Interrupt-driven transmit pump
//!
//! The pump walks one armed byte range, one byte per transmit interrupt. Ownership of the
//! cursor alternates between the task and the interrupt handler and is tagged by an atomic
//! state word:
//!
//! ```text
//!            arm (task)            step (isr)
//!   ┌──────┐ ─────────► ┌───────┐ ─────────► ┌──────────┐
//!   │ Idle │            │ Armed │            │ Stepping │
//!   └──────┘ ◄───────── └───────┘ ◄───────── └────┬─────┘
//!      ▲      cancel (task)         byte sent     │
//!      └──────────────────────────────────────────┘
//!                  range exhausted
//! ```
//!
//! The task touches the cursor only in `Idle`, the interrupt handler only in `Stepping`.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU8, Ordering};

use chardrv_os::SerialHooks;

const IDLE: u8 = 0;
const ARMED: u8 = 1;
const STEPPING: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum Step {
    Sent,
    /// The range was exhausted; the pump is idle and the transmit interrupt disabled
    Exhausted,
    /// The pump was not armed
    Spurious,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum Cancel {
    /// The interrupt handler exhausted the range first
    Completed,
    Aborted { remaining: usize },
}

struct Cursor {
    next: *const u8,
    end: *const u8,
}

impl Cursor {
    fn remaining(&self) -> usize {
        self.end as usize - self.next as usize
    }
}

pub(crate) struct TransmitPump {
    state: AtomicU8,
    cursor: UnsafeCell<Cursor>,
}

// Safety: cursor access is serialized by the state word: only the side that moved the pump
// out of `Armed` may touch it, and it publishes its writes with a release store.
unsafe impl Send for TransmitPump {}
unsafe impl Sync for TransmitPump {}

impl TransmitPump {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(IDLE),
            cursor: UnsafeCell::new(Cursor {
                next: core::ptr::null(),
                end: core::ptr::null(),
            }),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state.load(Ordering::Acquire) == IDLE
    }

    /// Hands `bytes` over to the interrupt handler.
    ///
    /// # Safety
    ///
    /// The pump must be idle and no other task may call `arm` concurrently. `bytes` must
    /// stay valid and unmodified until the pump is idle again, i.e. until `step` reported
    /// `Exhausted` or `cancel` returned.
    pub unsafe fn arm(&self, bytes: &[u8]) {
        debug_assert!(self.is_idle());

        let range = bytes.as_ptr_range();
        // Safety: the pump is idle, the interrupt handler does not touch the cursor
        unsafe {
            *self.cursor.get() = Cursor {
                next: range.start,
                end: range.end,
            };
        }
        self.state.store(ARMED, Ordering::Release);
    }

    /// Sends the next byte or reports exhaustion. Interrupt context only.
    pub fn step(&self, hooks: &impl SerialHooks) -> Step {
        if self
            .state
            .compare_exchange(ARMED, STEPPING, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            hooks.disable_tx_interrupt();
            // A task may have armed and enabled the interrupt since the exchange failed
            if self.state.load(Ordering::Acquire) == ARMED {
                hooks.enable_tx_interrupt();
            }
            return Step::Spurious;
        }

        // Safety: `Stepping` grants exclusive cursor access
        let cursor = unsafe { &mut *self.cursor.get() };
        if cursor.next == cursor.end {
            hooks.disable_tx_interrupt();
            self.state.store(IDLE, Ordering::Release);
            return Step::Exhausted;
        }

        // Safety: `next` lies inside the armed range, which outlives the armed phase
        let byte = unsafe { cursor.next.read() };
        cursor.next = unsafe { cursor.next.add(1) };
        hooks.send_byte(byte);
        self.state.store(ARMED, Ordering::Release);
        Step::Sent
    }

    /// Returns the pump to idle, waiting out a step in progress.
    ///
    /// The transmit interrupt should be disabled first, otherwise the handler may
    /// observe a spurious step.
    pub fn cancel(&self) -> Cancel {
        loop {
            match self
                .state
                .compare_exchange(ARMED, IDLE, Ordering::Acquire, Ordering::Acquire)
            {
                Ok(_) => {
                    // Safety: the task moved the pump out of `Armed`, the cursor is ours
                    let remaining = unsafe { (*self.cursor.get()).remaining() };
                    return Cancel::Aborted { remaining };
                }
                Err(IDLE) => return Cancel::Completed,
                Err(_) => core::hint::spin_loop(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use core::cell::{Cell, RefCell};
    use std::vec::Vec;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        tx_enabled: Cell<bool>,
        tx_disables: Cell<usize>,
        sent: RefCell<Vec<u8>>,
    }

    impl SerialHooks for Recorder {
        fn enable_tx_interrupt(&self) {
            self.tx_enabled.set(true);
        }

        fn disable_tx_interrupt(&self) {
            self.tx_enabled.set(false);
            self.tx_disables.set(self.tx_disables.get() + 1);
        }

        fn enable_rx_interrupt(&self) {}

        fn disable_rx_interrupt(&self) {}

        fn send_byte(&self, byte: u8) {
            self.sent.borrow_mut().push(byte);
        }
    }

    #[test]
    fn drains_range_in_order() {
        let pump = TransmitPump::new();
        let hooks = Recorder::default();
        let data = *b"abc";

        unsafe { pump.arm(&data) };
        hooks.enable_tx_interrupt();
        assert!(!pump.is_idle());

        assert_eq!(pump.step(&hooks), Step::Sent);
        assert_eq!(pump.step(&hooks), Step::Sent);
        assert_eq!(pump.step(&hooks), Step::Sent);
        assert!(hooks.tx_enabled.get());
        assert_eq!(pump.step(&hooks), Step::Exhausted);

        assert!(pump.is_idle());
        assert!(!hooks.tx_enabled.get());
        assert_eq!(hooks.sent.borrow().as_slice(), b"abc");
    }

    #[test]
    fn empty_range_exhausts_on_first_step() {
        let pump = TransmitPump::new();
        let hooks = Recorder::default();

        unsafe { pump.arm(&[]) };
        assert_eq!(pump.step(&hooks), Step::Exhausted);
        assert!(hooks.sent.borrow().is_empty());
        assert_eq!(hooks.tx_disables.get(), 1);
    }

    #[test]
    fn idle_step_is_spurious() {
        let pump = TransmitPump::new();
        let hooks = Recorder::default();
        hooks.enable_tx_interrupt();

        assert_eq!(pump.step(&hooks), Step::Spurious);
        assert!(!hooks.tx_enabled.get());
        assert!(hooks.sent.borrow().is_empty());
    }

    /// Arms the pump from inside the disable hook, as a task racing a spurious step would.
    struct RacingTask<'a> {
        pump: &'a TransmitPump,
        recorder: Recorder,
        pending: Cell<Option<&'static [u8]>>,
    }

    impl SerialHooks for RacingTask<'_> {
        fn enable_tx_interrupt(&self) {
            self.recorder.enable_tx_interrupt();
        }

        fn disable_tx_interrupt(&self) {
            self.recorder.disable_tx_interrupt();
            if let Some(bytes) = self.pending.take() {
                unsafe { self.pump.arm(bytes) };
                self.recorder.enable_tx_interrupt();
            }
        }

        fn enable_rx_interrupt(&self) {}

        fn disable_rx_interrupt(&self) {}

        fn send_byte(&self, byte: u8) {
            self.recorder.send_byte(byte);
        }
    }

    #[test]
    fn spurious_step_keeps_interrupt_of_new_arm() {
        let pump = TransmitPump::new();
        let hooks = RacingTask {
            pump: &pump,
            recorder: Recorder::default(),
            pending: Cell::new(Some(b"ok".as_slice())),
        };

        assert_eq!(pump.step(&hooks), Step::Spurious);
        assert!(hooks.recorder.tx_enabled.get());

        assert_eq!(pump.step(&hooks), Step::Sent);
        assert_eq!(pump.step(&hooks), Step::Sent);
        assert_eq!(pump.step(&hooks), Step::Exhausted);
        assert_eq!(hooks.recorder.sent.borrow().as_slice(), b"ok");
        assert!(!hooks.recorder.tx_enabled.get());
    }

    #[test]
    fn cancel_reports_unsent_bytes() {
        let pump = TransmitPump::new();
        let hooks = Recorder::default();
        let data = *b"hello";

        unsafe { pump.arm(&data) };
        assert_eq!(pump.step(&hooks), Step::Sent);
        assert_eq!(pump.step(&hooks), Step::Sent);
        assert_eq!(pump.cancel(), Cancel::Aborted { remaining: 3 });
        assert!(pump.is_idle());

        // A late interrupt does not touch the released range
        assert_eq!(pump.step(&hooks), Step::Spurious);
        assert_eq!(hooks.sent.borrow().as_slice(), b"he");
    }

    #[test]
    fn cancel_after_exhaustion_completes() {
        let pump = TransmitPump::new();
        let hooks = Recorder::default();

        unsafe { pump.arm(b"x") };
        assert_eq!(pump.step(&hooks), Step::Sent);
        assert_eq!(pump.step(&hooks), Step::Exhausted);
        assert_eq!(pump.cancel(), Cancel::Completed);
    }

    #[test]
    fn rearm_after_cancel() {
        let pump = TransmitPump::new();
        let hooks = Recorder::default();

        unsafe { pump.arm(b"abc") };
        assert_eq!(pump.cancel(), Cancel::Aborted { remaining: 3 });

        unsafe { pump.arm(b"z") };
        assert_eq!(pump.step(&hooks), Step::Sent);
        assert_eq!(pump.step(&hooks), Step::Exhausted);
        assert_eq!(hooks.sent.borrow().as_slice(), b"z");
    }
}
