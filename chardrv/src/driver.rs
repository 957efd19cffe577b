//! Character driver facade
//!
//! The driver is created inert and becomes operational once split into a task-side [`Port`]
//! and an interrupt-side [`Interrupts`] handle. Both handles borrow the driver, so it can be
//! neither moved nor dropped while an interrupt vector may still reach it.
//!
//! ## Examples
//!
//! ```
//! use chardrv::driver::CharDriver;
//! use chardrv::framer::LineFramer;
//! use chardrv_host::{HostOs, SimUart};
//!
//! let uart = SimUart::new();
//! let mut driver = CharDriver::<HostOs, _, _>::new(&uart, LineFramer::<64, 16>::default());
//! let (port, interrupts) = driver.split();
//!
//! uart.inject(b"ping\n", |byte| interrupts.receive_byte(byte));
//! assert_eq!(port.readline(chardrv::core::Timeout::ZERO).as_bytes(), b"ping");
//! ```
//!
//! Interrupt vectors usually need `'static` access, which static allocation provides:
//! ```
//! # use chardrv::driver::CharDriver;
//! # use chardrv::framer::LineFramer;
//! # use chardrv_host::{HostOs, SimUart};
//! use static_cell::StaticCell;
//!
//! type Driver = CharDriver<HostOs, &'static SimUart, LineFramer<64, 16>>;
//!
//! static UART: StaticCell<SimUart> = StaticCell::new();
//! static DRIVER: StaticCell<Driver> = StaticCell::new();
//!
//! let uart: &'static SimUart = UART.init(SimUart::new());
//! let driver = DRIVER.init(CharDriver::new(uart, LineFramer::default()));
//! let (port, interrupts) = driver.split();
//! ```

use chardrv_os::{Completion, Os, SerialHooks, TaskLock};

use crate::core::Timeout;
use crate::framer::{Framer, FramerStats};
use crate::funnel::ReceiveFunnel;
use crate::pump::{Cancel, Step, TransmitPump};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteError {
    /// A string was not fully sent in time. `unsent` bytes of it never left the driver;
    /// the remaining strings were not started.
    Timeout { unsent: usize },
}

/// Interrupt-driven line-oriented character driver
///
/// Owns the framer, the task lock, the line signal and the transmit completion event.
/// `H` controls the peripheral, `F` frames received bytes into lines.
pub struct CharDriver<O: Os, H: SerialHooks, F: Framer> {
    hooks: H,
    lock: TaskLock<O>,
    pump: TransmitPump,
    completion: Completion<O>,
    funnel: ReceiveFunnel<O, F>,
}

impl<O: Os, H: SerialHooks, F: Framer> CharDriver<O, H, F> {
    /// Creates the driver with every interrupt disabled.
    ///
    /// The line signal holds up to twice the framer's line capacity.
    pub fn new(hooks: H, framer: F) -> Self {
        hooks.disable_tx_interrupt();
        hooks.disable_rx_interrupt();
        Self {
            hooks,
            lock: TaskLock::new(),
            pump: TransmitPump::new(),
            completion: Completion::new(),
            funnel: ReceiveFunnel::new(framer),
        }
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Enables reception and returns the task-side and interrupt-side handles.
    ///
    /// Interrupt vectors must be routed to the returned [`Interrupts`] handle before any
    /// received byte is expected.
    pub fn split(&mut self) -> (Port<'_, O, H, F>, Interrupts<'_>)
    where
        H: Sync,
        F: Send,
    {
        let this: &Self = self;
        this.hooks.enable_rx_interrupt();
        debug!("Receive interrupt enabled");
        (Port(this), Interrupts(this))
    }

    fn transmit(&self, bytes: &[u8], timeout: Timeout) -> Result<(), WriteError> {
        self.completion.reset();
        // Safety: the task lock is held and the pump is idle between transmissions. Every
        // exit path below returns the pump to idle before `bytes` is released.
        unsafe { self.pump.arm(bytes) };
        let armed = Armed(self);
        self.hooks.enable_tx_interrupt();

        let completed = self.completion.wait(timeout);
        core::mem::forget(armed);
        if completed {
            return Ok(());
        }

        self.hooks.disable_tx_interrupt();
        match self.pump.cancel() {
            Cancel::Completed => {
                // Exhausted concurrently with the timeout; consume the completion
                self.completion.wait(Timeout::Forever);
                Ok(())
            }
            Cancel::Aborted { remaining } => {
                warn!("Transmit timed out, {} of {} bytes unsent", remaining, bytes.len());
                Err(WriteError::Timeout { unsent: remaining })
            }
        }
    }
}

impl<O: Os, H: SerialHooks, F: Framer> Drop for CharDriver<O, H, F> {
    fn drop(&mut self) {
        self.hooks.disable_rx_interrupt();
        self.hooks.disable_tx_interrupt();
        debug!("Interrupts disabled");
    }
}

/// Disarms the pump if a transmission is left by unwinding
struct Armed<'a, O: Os, H: SerialHooks, F: Framer>(&'a CharDriver<O, H, F>);

impl<'a, O: Os, H: SerialHooks, F: Framer> Drop for Armed<'a, O, H, F> {
    fn drop(&mut self) {
        self.0.hooks.disable_tx_interrupt();
        self.0.pump.cancel();
    }
}

/// Task-side driver handle
///
/// Every operation runs under the driver's task lock, so concurrent callers are served one
/// after another. Must not be used from interrupt context.
pub struct Port<'a, O: Os, H: SerialHooks, F: Framer>(&'a CharDriver<O, H, F>);

impl<'a, O: Os, H: SerialHooks, F: Framer> Clone for Port<'a, O, H, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, O: Os, H: SerialHooks, F: Framer> Copy for Port<'a, O, H, F> {}

impl<'a, O: Os, H: SerialHooks, F: Framer> Port<'a, O, H, F> {
    /// Sends `strings` back to back, in order, without separators.
    ///
    /// Blocks until the last byte is handed to the peripheral. Bytes are streamed directly
    /// from the caller's buffers, which stay borrowed for the whole call.
    pub fn write<I>(&self, strings: I)
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let _guard = self.0.lock.lock();
        for string in strings {
            let result = self.0.transmit(string.as_ref(), Timeout::Forever);
            debug_assert!(result.is_ok());
        }
    }

    /// Same as [`write`](Self::write), with the wait for each string bounded by `timeout`.
    ///
    /// On expiry the transmission is cancelled and the remaining strings are skipped.
    /// The driver stays usable.
    pub fn try_write<I>(&self, strings: I, timeout: Timeout) -> Result<(), WriteError>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let _guard = self.0.lock.lock();
        for string in strings {
            self.0.transmit(string.as_ref(), timeout)?;
        }
        Ok(())
    }

    /// Returns the oldest completed line, or an empty line if none arrives within `timeout`.
    ///
    /// A timed-out call consumes nothing.
    pub fn readline(&self, timeout: Timeout) -> F::Line {
        let _guard = self.0.lock.lock();
        match self.0.funnel.take(timeout) {
            Some(line) => line,
            None => {
                trace!("No line within timeout");
                F::Line::default()
            }
        }
    }

    /// Number of completed lines not yet read
    pub fn pending_lines(&self) -> usize {
        self.0.funnel.pending_lines()
    }

    pub fn framer_stats(&self) -> FramerStats {
        self.0.funnel.stats()
    }
}

pub(crate) trait DynamicInterrupts {
    fn transmit_step(&self);
    fn receive_byte(&self, byte: u8);
}

impl<O: Os, H: SerialHooks, F: Framer> DynamicInterrupts for CharDriver<O, H, F> {
    fn transmit_step(&self) {
        match self.pump.step(&self.hooks) {
            Step::Sent => {}
            Step::Exhausted => {
                trace!("Transmit range exhausted");
                self.completion.signal_from_isr();
            }
            Step::Spurious => trace!("Spurious transmit interrupt"),
        }
    }

    fn receive_byte(&self, byte: u8) {
        self.funnel.feed(byte);
    }
}

/// Interrupt-side driver handle
///
/// Both entry points must be called from the peripheral's interrupt vectors only, never
/// concurrently with themselves.
#[derive(Clone, Copy)]
pub struct Interrupts<'a>(&'a (dyn DynamicInterrupts + Sync));

impl<'a> Interrupts<'a> {
    /// Transmit-ready vector: sends one byte or completes the armed string.
    pub fn transmit_step(&self) {
        self.0.transmit_step();
    }

    /// Receive vector: feeds one received byte to the framer.
    pub fn receive_byte(&self, byte: u8) {
        self.0.receive_byte(byte);
    }
}
