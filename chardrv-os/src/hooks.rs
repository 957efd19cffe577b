/// Interrupt control and byte output of a UART-class peripheral
///
/// Every method may be called from both task and interrupt context and must not block.
/// `send_byte` is only called from the transmit interrupt handler, so the peripheral is
/// guaranteed to have room for one byte.
pub trait SerialHooks {
    fn enable_tx_interrupt(&self);
    fn disable_tx_interrupt(&self);
    fn enable_rx_interrupt(&self);
    fn disable_rx_interrupt(&self);
    fn send_byte(&self, byte: u8);
}

impl<T: SerialHooks + ?Sized> SerialHooks for &T {
    fn enable_tx_interrupt(&self) {
        T::enable_tx_interrupt(self)
    }

    fn disable_tx_interrupt(&self) {
        T::disable_tx_interrupt(self)
    }

    fn enable_rx_interrupt(&self) {
        T::enable_rx_interrupt(self)
    }

    fn disable_rx_interrupt(&self) {
        T::disable_rx_interrupt(self)
    }

    fn send_byte(&self, byte: u8) {
        T::send_byte(self, byte)
    }
}

/// Serial hooks made of plain function pointers
///
/// Convenient when the peripheral is accessed through free functions of a HAL or C shim.
#[derive(Debug, Clone, Copy)]
pub struct FnHooks {
    pub tx_interrupt_enabler: fn(),
    pub tx_interrupt_disabler: fn(),
    pub rx_interrupt_enabler: fn(),
    pub rx_interrupt_disabler: fn(),
    pub byte_sender: fn(u8),
}

impl SerialHooks for FnHooks {
    fn enable_tx_interrupt(&self) {
        (self.tx_interrupt_enabler)()
    }

    fn disable_tx_interrupt(&self) {
        (self.tx_interrupt_disabler)()
    }

    fn enable_rx_interrupt(&self) {
        (self.rx_interrupt_enabler)()
    }

    fn disable_rx_interrupt(&self) {
        (self.rx_interrupt_disabler)()
    }

    fn send_byte(&self, byte: u8) {
        (self.byte_sender)(byte)
    }
}
