//! GPIO bank with eight external pins.

use super::{pin::IoPin, read_le, write_le, AccessWidth};

/// Offset of the direction register; bit *i* set means pin *i* is an
/// output.
pub const GPIO_CR: u64 = 0x0;
/// Offset of the latched input snapshot register.
pub const GPIO_IN: u64 = 0x4;
/// Offset of the output register; bit *i* drives pin *i* when it is
/// configured as an output.
pub const GPIO_OUT: u64 = 0x8;

/// Number of pins in one GPIO bank.
pub const GPIO_PINS: usize = 8;

const REGISTER_BYTES: usize = 12;

/// GPIO register block (`CR`/`IN`/`OUT`, u32 each, little-endian) and its
/// eight external pins.
///
/// The bank ticks on every cycle: output pins drive their `OUT` bit onto
/// the wire; input pins latch any pending wire value into `IN`, which is
/// rebuilt from zero each tick.
#[derive(Debug, Default)]
pub struct Gpio {
    regs: [u8; REGISTER_BYTES],
    /// External pins, index *i* paired with register bit *i*.
    pub pins: [IoPin; GPIO_PINS],
}

impl Gpio {
    /// Creates a bank with every pin configured as an input.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Size of the register block in bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        REGISTER_BYTES as u64
    }

    /// Raw load at `offset`.
    #[must_use]
    pub fn load(&self, offset: u64, width: AccessWidth) -> u64 {
        read_le(&self.regs, offset, width)
    }

    /// Raw store at `offset`.
    pub fn store(&mut self, offset: u64, width: AccessWidth, value: u64) {
        write_le(&mut self.regs, offset, width, value);
    }

    /// Drives output pins from `OUT` and latches input pins into `IN`.
    pub fn tick(&mut self) {
        let cr = read_le(&self.regs, GPIO_CR, AccessWidth::Word) as u32;
        let out = read_le(&self.regs, GPIO_OUT, AccessWidth::Word) as u8;
        let mut input = 0_u32;

        for (index, pin) in self.pins.iter_mut().enumerate() {
            if cr & (1 << index) != 0 {
                pin.set(u8::from(out & (1 << index) != 0));
            } else if let Some(level) = pin.take() {
                input |= u32::from(level != 0) << index;
            }
        }

        write_le(&mut self.regs, GPIO_IN, AccessWidth::Word, u64::from(input));
    }
}

#[cfg(test)]
mod tests {
    use super::{AccessWidth, Gpio, GPIO_CR, GPIO_IN, GPIO_OUT};

    #[test]
    fn output_pins_drive_their_out_bit_each_tick() {
        let mut gpio = Gpio::new();
        gpio.store(GPIO_CR, AccessWidth::Word, 0b0000_0010);
        gpio.store(GPIO_OUT, AccessWidth::Word, 0b0000_0010);

        gpio.tick();

        assert_eq!(gpio.pins[1].take(), Some(1));
        assert!(!gpio.pins[0].has_value());

        gpio.store(GPIO_OUT, AccessWidth::Word, 0);
        gpio.tick();
        assert_eq!(gpio.pins[1].take(), Some(0));
    }

    #[test]
    fn input_pins_latch_pending_levels_into_in() {
        let mut gpio = Gpio::new();
        gpio.pins[0].set(1);
        gpio.pins[3].set(0);

        gpio.tick();

        // Nonzero levels set their bit; zero levels are consumed silently.
        assert_eq!(gpio.load(GPIO_IN, AccessWidth::Word), 0b0000_0001);
        assert!(!gpio.pins[0].has_value());
        assert!(!gpio.pins[3].has_value());
    }

    #[test]
    fn in_snapshot_is_rebuilt_from_zero_each_tick() {
        let mut gpio = Gpio::new();
        gpio.pins[2].set(1);
        gpio.tick();
        assert_eq!(gpio.load(GPIO_IN, AccessWidth::Word), 0b0000_0100);

        // No pending value on the next tick: the latch clears.
        gpio.tick();
        assert_eq!(gpio.load(GPIO_IN, AccessWidth::Word), 0);
    }
}
