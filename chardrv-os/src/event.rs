use chardrv_core::{EventBits, Timeout};

use crate::primitive::{Os, RawEventGroup, WaitOptions};

const COMPLETION_BIT: EventBits = EventBits::from_bits_truncating(0x01);
const FLAG_BIT: EventBits = EventBits::from_bits_truncating(0x01);

/// One-shot completion event
///
/// A single sticky bit set from interrupt context and consumed by one waiting task.
pub struct Completion<O: Os> {
    events: O::EventGroup,
}

impl<O: Os> Completion<O> {
    pub fn new() -> Self {
        Self {
            events: O::create_event_group(),
        }
    }

    /// Drops a stale completion, if any.
    pub fn reset(&self) {
        self.events.clear(COMPLETION_BIT);
    }

    pub fn signal_from_isr(&self) {
        self.events.set_from_isr(COMPLETION_BIT);
    }

    pub fn is_signaled(&self) -> bool {
        self.events.get().contains(COMPLETION_BIT)
    }

    /// Waits for the completion and consumes it. Returns `false` on timeout.
    pub fn wait(&self, timeout: Timeout) -> bool {
        let options = WaitOptions {
            clear_on_exit: true,
            wait_for_all: true,
        };
        self.events.wait(COMPLETION_BIT, options, timeout).is_some()
    }
}

impl<O: Os> Default for Completion<O> {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-setter, multiple-awaiter flag
///
/// Waiting tasks block until the flag is set. Waiting does not reset the flag, so every
/// awaiter is released by a single `set`. The flag is reset by default.
pub struct Flag<O: Os> {
    events: O::EventGroup,
}

impl<O: Os> Flag<O> {
    pub fn new() -> Self {
        Self {
            events: O::create_event_group(),
        }
    }

    pub fn wait_set(&self) {
        let released = self.wait_set_timeout(Timeout::Forever);
        debug_assert!(released);
    }

    pub fn wait_set_timeout(&self, timeout: Timeout) -> bool {
        let options = WaitOptions {
            clear_on_exit: false,
            wait_for_all: false,
        };
        self.events.wait(FLAG_BIT, options, timeout).is_some()
    }

    pub fn set(&self) {
        self.events.set(FLAG_BIT);
    }

    pub fn reset(&self) {
        self.events.clear(FLAG_BIT);
    }

    pub fn is_set(&self) -> bool {
        self.events.get().contains(FLAG_BIT)
    }
}

impl<O: Os> Default for Flag<O> {
    fn default() -> Self {
        Self::new()
    }
}
