//! Address-space dispatcher over mapped MMIO devices.

use crate::fault::BusFault;
use crate::mmio::{AccessWidth, IoPin, Mmio};

/// Stable identifier of a mapped device within one address space.
///
/// Identifiers are assigned in registration order and never move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MmioId(usize);

/// Handle naming one pin of one mapped peripheral, resolved through the
/// owning address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PinHandle {
    /// The mapped device owning the pin.
    pub device: MmioId,
    /// Pin index within the device (UART: 0 is TX; GPIO: the bank index).
    pub pin: usize,
}

impl PinHandle {
    /// Creates a handle for pin `pin` of device `device`.
    #[must_use]
    pub const fn new(device: MmioId, pin: usize) -> Self {
        Self { device, pin }
    }
}

/// One peripheral mapped at a fixed base address.
#[derive(Debug)]
pub struct MappedDevice {
    name: String,
    base: u64,
    mmio: Mmio,
}

impl MappedDevice {
    /// Maps `mmio` at `base` under a display name.
    #[must_use]
    pub fn new(name: impl Into<String>, base: u64, mmio: Mmio) -> Self {
        Self {
            name: name.into(),
            base,
            mmio,
        }
    }

    /// Display name of the device.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// First mapped address.
    #[must_use]
    pub const fn base(&self) -> u64 {
        self.base
    }

    /// Size of the mapped range in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.mmio.size()
    }

    /// Last mapped address, inclusive.
    #[must_use]
    pub fn end(&self) -> u64 {
        self.base + self.size() - 1
    }

    fn tick_if_needed(&mut self) {
        if self.mmio.needs_update() {
            self.mmio.tick();
        }
    }
}

/// The bus: a registration-ordered collection of mapped devices.
///
/// No two mapped ranges may overlap; access resolution finds the unique
/// device whose range fully contains the requested span.
#[derive(Debug, Default)]
pub struct AddressSpace {
    devices: Vec<MappedDevice>,
}

impl AddressSpace {
    /// Creates an empty address space.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a device.
    ///
    /// # Panics
    ///
    /// Overlapping ranges are a fatal configuration error, not a
    /// recoverable fault: the conflict is logged and the process aborts
    /// by panic.
    pub fn add_device(&mut self, device: MappedDevice) -> MmioId {
        for mapped in &self.devices {
            if device.base() <= mapped.end() && mapped.base() <= device.end() {
                log::error!(
                    "tried to map {} to {:#x}:{:#x}, occupied by {} at {:#x}:{:#x}",
                    device.name(),
                    device.base(),
                    device.end(),
                    mapped.name(),
                    mapped.base(),
                    mapped.end(),
                );
                panic!("tried to map device to occupied address range");
            }
        }

        self.devices.push(device);
        MmioId(self.devices.len() - 1)
    }

    /// Loads `width` bytes at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`BusFault::AccessFault`] when no mapped device fully
    /// contains the access span.
    pub fn load(&mut self, address: u64, width: AccessWidth) -> Result<u64, BusFault> {
        let device = Self::find(&mut self.devices, address, width)?;
        Ok(device.mmio.load(address - device.base, width))
    }

    /// Stores the low `width` bytes of `value` at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`BusFault::AccessFault`] when no mapped device fully
    /// contains the access span.
    pub fn store(&mut self, address: u64, width: AccessWidth, value: u64) -> Result<(), BusFault> {
        let device = Self::find(&mut self.devices, address, width)?;
        device.mmio.store(address - device.base, width, value);
        Ok(())
    }

    /// Conditionally ticks every mapped device once, in registration
    /// order.
    pub fn tick_devices(&mut self) {
        for device in &mut self.devices {
            device.tick_if_needed();
        }
    }

    /// Mapped devices in registration order, for inspection.
    #[must_use]
    pub fn devices(&self) -> &[MappedDevice] {
        &self.devices
    }

    /// Resolves a pin handle to the peripheral pin it names.
    pub fn pin_mut(&mut self, handle: PinHandle) -> Option<&mut IoPin> {
        let device = self.devices.get_mut(handle.device.0)?;
        match &mut device.mmio {
            Mmio::Uart(uart) => (handle.pin == 0).then_some(&mut uart.tx_pin),
            Mmio::Gpio(gpio) => gpio.pins.get_mut(handle.pin),
            Mmio::Memory(_) => None,
        }
    }

    fn find(
        devices: &mut [MappedDevice],
        address: u64,
        width: AccessWidth,
    ) -> Result<&mut MappedDevice, BusFault> {
        let fault = BusFault::AccessFault {
            address,
            width: width.bytes() as u8,
        };
        let span_end = address.checked_add(width.bytes() - 1).ok_or(fault)?;

        devices
            .iter_mut()
            .find(|device| address >= device.base() && span_end <= device.end())
            .ok_or_else(|| {
                log::error!("invalid memory access at {address:#x}");
                fault
            })
    }
}
