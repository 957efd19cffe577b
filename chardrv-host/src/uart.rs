use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

use chardrv_os::SerialHooks;

use crate::fmt::Bytes;
use crate::os::lock;

/// Period at which an idle transmitter re-checks its stop flag
const STOP_POLL: Duration = Duration::from_millis(1);

/// Simulated UART peripheral
///
/// Records every byte handed to the transmitter and models the two interrupt-enable lines.
/// The interrupt controller is played by the caller: a thread running
/// [`run_transmitter`](Self::run_transmitter) fires the transmit vector while the transmit
/// interrupt is enabled, and [`inject`](Self::inject) fires the receive vector per byte.
#[derive(Default)]
pub struct SimUart {
    tx_enabled: Mutex<bool>,
    tx_changed: Condvar,
    rx_enabled: AtomicBool,
    wire: Mutex<Vec<u8>>,
    tx_cycles: AtomicUsize,
}

impl SimUart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires `vector` while the transmit interrupt is enabled, until `stop` is set.
    ///
    /// Each invocation counts as one transmit-interrupt cycle. The transmitter is always
    /// ready, so the vector fires back to back.
    pub fn run_transmitter(&self, stop: &AtomicBool, mut vector: impl FnMut()) {
        while !stop.load(Ordering::Acquire) {
            let enabled = {
                let guard = lock(&self.tx_enabled);
                let (guard, _) = self
                    .tx_changed
                    .wait_timeout_while(guard, STOP_POLL, |enabled| !*enabled)
                    .unwrap_or_else(PoisonError::into_inner);
                *guard
            };
            if enabled {
                self.tx_cycles.fetch_add(1, Ordering::Relaxed);
                vector();
            }
        }
    }

    /// Fires `vector` for each byte received while the receive interrupt is enabled.
    ///
    /// Returns the number of delivered bytes. Bytes arriving with the interrupt disabled are
    /// lost, as on a real line.
    pub fn inject(&self, bytes: &[u8], mut vector: impl FnMut(u8)) -> usize {
        let mut delivered = 0;
        for &byte in bytes {
            if self.rx_enabled() {
                vector(byte);
                delivered += 1;
            }
        }
        if delivered != bytes.len() {
            warn!("{} received bytes lost", bytes.len() - delivered);
        }
        delivered
    }

    /// Bytes sent so far
    pub fn sent(&self) -> Vec<u8> {
        lock(&self.wire).clone()
    }

    /// Returns and forgets the bytes sent so far.
    pub fn take_sent(&self) -> Vec<u8> {
        std::mem::take(&mut *lock(&self.wire))
    }

    pub fn tx_cycles(&self) -> usize {
        self.tx_cycles.load(Ordering::Relaxed)
    }

    pub fn tx_enabled(&self) -> bool {
        *lock(&self.tx_enabled)
    }

    pub fn rx_enabled(&self) -> bool {
        self.rx_enabled.load(Ordering::Acquire)
    }

    fn set_tx_enabled(&self, enabled: bool) {
        *lock(&self.tx_enabled) = enabled;
        self.tx_changed.notify_all();
    }
}

impl SerialHooks for SimUart {
    fn enable_tx_interrupt(&self) {
        self.set_tx_enabled(true);
    }

    fn disable_tx_interrupt(&self) {
        self.set_tx_enabled(false);
    }

    fn enable_rx_interrupt(&self) {
        self.rx_enabled.store(true, Ordering::Release);
    }

    fn disable_rx_interrupt(&self) {
        self.rx_enabled.store(false, Ordering::Release);
    }

    fn send_byte(&self, byte: u8) {
        trace!("TX {}", Bytes(&[byte]));
        lock(&self.wire).push(byte);
    }
}
