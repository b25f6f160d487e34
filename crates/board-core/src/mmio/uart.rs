//! UART peripheral with a single TX wire.

use super::{pin::IoPin, read_le, write_le, AccessWidth};

/// Offset of the control register (reserved, unused by current logic).
pub const UART_CR: u64 = 0x0;
/// Offset of the transmit register; the low byte is sent once per tick.
pub const UART_TX: u64 = 0x4;
/// Offset of the receive register (reserved for future receive logic).
pub const UART_RX: u64 = 0x8;

const REGISTER_BYTES: usize = 12;

/// UART register block (`CR`/`TX`/`RX`, u32 each, little-endian).
///
/// Any raw access marks the device dirty; the next tick pushes the low
/// byte of `TX` onto the TX pin, clears `TX`, and clears the dirty mark.
#[derive(Debug, Default)]
pub struct Uart {
    regs: [u8; REGISTER_BYTES],
    value_changed: bool,
    /// Transmit wire, sampled by the owning CPU device after each tick.
    pub tx_pin: IoPin,
}

impl Uart {
    /// Creates a quiescent UART.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Size of the register block in bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        REGISTER_BYTES as u64
    }

    /// Raw load at `offset`; marks the device dirty.
    pub fn load(&mut self, offset: u64, width: AccessWidth) -> u64 {
        self.value_changed = true;
        read_le(&self.regs, offset, width)
    }

    /// Raw store at `offset`; marks the device dirty.
    pub fn store(&mut self, offset: u64, width: AccessWidth, value: u64) {
        self.value_changed = true;
        write_le(&mut self.regs, offset, width, value);
    }

    /// `true` while a raw access since the last tick is pending.
    #[must_use]
    pub const fn needs_update(&self) -> bool {
        self.value_changed
    }

    /// Transmits the low byte of `TX` onto the TX pin and clears `TX`.
    pub fn tick(&mut self) {
        let tx = read_le(&self.regs, UART_TX, AccessWidth::Word);
        self.tx_pin.set(tx as u8);
        write_le(&mut self.regs, UART_TX, AccessWidth::Word, 0);
        self.value_changed = false;
    }
}
