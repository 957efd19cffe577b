use core::cell::RefCell;

use chardrv_os::{CountingSignal, Os};
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::core::Timeout;
use crate::fmt::Bytes;
use crate::framer::{Framer, FramerStats};

/// Receive side: framer plus a line-count signal
///
/// The signal is given only after the completed line is queued, so a successful take always
/// finds a line to pop.
pub(crate) struct ReceiveFunnel<O: Os, F> {
    framer: Mutex<CriticalSectionRawMutex, RefCell<F>>,
    signal: CountingSignal<O>,
}

impl<O: Os, F: Framer> ReceiveFunnel<O, F> {
    pub fn new(framer: F) -> Self {
        Self {
            framer: Mutex::new(RefCell::new(framer)),
            signal: CountingSignal::new(2 * F::MAX_LINES),
        }
    }

    /// Interrupt context only.
    pub fn feed(&self, byte: u8) {
        let completed = self.framer.lock(|framer| framer.borrow_mut().push_byte(byte));
        if completed {
            trace!("Line completed");
            if !self.signal.isr().give() {
                warn!("Line signal saturated");
            }
        }
    }

    /// Waits for a completed line. A timed-out call leaves the signal and the backlog intact.
    pub fn take(&self, timeout: Timeout) -> Option<F::Line> {
        if !self.signal.task().take(timeout) {
            return None;
        }
        let line = self.framer.lock(|framer| framer.borrow_mut().pop_line());
        match &line {
            Some(line) => trace!("Line popped: {}", Bytes(line.as_ref())),
            None => warn!("Line signal without a queued line"),
        }
        line
    }

    pub fn pending_lines(&self) -> usize {
        self.framer.lock(|framer| framer.borrow().pending_lines())
    }

    pub fn stats(&self) -> FramerStats {
        self.framer.lock(|framer| framer.borrow().stats())
    }
}
