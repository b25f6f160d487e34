//! CPU package: harts, their address space, and pin/track forwarding.

use std::collections::BTreeMap;

use crate::bus::{AddressSpace, PinHandle};
use crate::connect::Connector;
use crate::draw::{Color, Frame, Shape, Vec2};
use crate::hart::Core;
use crate::track::Direction;

const PACKAGE: Color = Color::rgb(0x10, 0x10, 0x10);
const LABEL: Color = Color::rgb(0xFF, 0xFF, 0xFF);

/// CPU board device: one address space shared by its cores, plus the
/// wiring tables that forward peripheral pins onto bound tracks.
///
/// Peripheral pins are referenced through [`PinHandle`]s resolved against
/// the owned address space, so the wiring holds no borrowed pointers into
/// the peripherals.
#[derive(Debug)]
pub struct CpuDevice {
    connector: Connector,
    address_space: AddressSpace,
    cores: Vec<Core>,
    pins: BTreeMap<u32, PinHandle>,
    pin_tracks: BTreeMap<String, u32>,
}

impl CpuDevice {
    /// Creates a package with `num_cores` halted cores and an empty
    /// address space.
    #[must_use]
    pub fn new(num_cores: usize, position: Vec2) -> Self {
        Self {
            connector: Connector::new(position, Vec2::new(100.0, 100.0)),
            address_space: AddressSpace::new(),
            cores: (0..num_cores).map(|_| Core::new()).collect(),
            pins: BTreeMap::new(),
            pin_tracks: BTreeMap::new(),
        }
    }

    /// The package's address space.
    #[must_use]
    pub const fn address_space(&self) -> &AddressSpace {
        &self.address_space
    }

    /// The package's address space, for mapping devices and loading
    /// images.
    pub const fn address_space_mut(&mut self) -> &mut AddressSpace {
        &mut self.address_space
    }

    /// The package's cores.
    #[must_use]
    pub fn cores(&self) -> &[Core] {
        &self.cores
    }

    /// The package's cores, for inspection and test setup.
    pub fn cores_mut(&mut self) -> &mut [Core] {
        &mut self.cores
    }

    /// Registers a peripheral pin under an external pin number.
    pub fn attach_pin(&mut self, number: u32, handle: PinHandle) {
        self.pins.insert(number, handle);
    }

    /// Routes an external pin number onto a named track binding.
    pub fn attach_pin_to_track(&mut self, number: u32, track: &str) {
        self.pin_tracks.insert(track.to_owned(), number);
    }

    /// Track-termination capability.
    #[must_use]
    pub const fn connector(&self) -> &Connector {
        &self.connector
    }

    /// Track-termination capability, for wiring.
    pub const fn connector_mut(&mut self) -> &mut Connector {
        &mut self.connector
    }

    /// Steps every core once, then forwards pins onto tracks by
    /// direction: MOSI moves a pending pin value onto the track, MISO
    /// moves a pending track value onto the pin.
    pub fn tick(&mut self) {
        for core in &mut self.cores {
            core.step(&mut self.address_space);
        }

        for (track_name, pin_number) in &self.pin_tracks {
            let Some(track) = self.connector.track(track_name) else {
                continue;
            };
            let Some(handle) = self.pins.get(pin_number) else {
                continue;
            };
            let Some(pin) = self.address_space.pin_mut(*handle) else {
                continue;
            };

            match track.direction() {
                Direction::Mosi => {
                    if let Some(value) = pin.take() {
                        track.set_value(value);
                    }
                }
                Direction::Miso => {
                    if let Some(value) = track.get_value() {
                        pin.set(value);
                    }
                }
            }
        }
    }

    /// `true` while any core is still running.
    #[must_use]
    pub fn needs_update(&self) -> bool {
        self.cores.iter().any(|core| !core.is_halted())
    }

    /// Resets every core.
    pub fn reset(&mut self) {
        for core in &mut self.cores {
            core.reset();
        }
    }

    /// Renders the package; hovering lists the mapped MMIO ranges.
    pub fn draw(&mut self, start: Vec2, frame: &mut Frame) {
        let min = start + self.connector.position();
        let max = min + self.connector.size();

        frame.push(Shape::Rect {
            min,
            max,
            color: PACKAGE,
        });
        frame.push(Shape::Text {
            pos: min + Vec2::new(10.0, 10.0),
            color: LABEL,
            text: format!("RISC-V\n {} Core", self.cores.len()),
        });

        if frame.hovered(min, max) {
            for (index, device) in self.address_space.devices().iter().enumerate() {
                frame.push(Shape::Text {
                    pos: max + Vec2::new(0.0, 14.0 * index as f32),
                    color: LABEL,
                    text: format!(
                        "{}: {:#018X} - {:#018X}",
                        device.name(),
                        device.base(),
                        device.end()
                    ),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::CpuDevice;
    use crate::bus::{MappedDevice, PinHandle};
    use crate::devices::DeviceId;
    use crate::draw::Vec2;
    use crate::mmio::{Gpio, Memory, Mmio, Uart};
    use crate::track::{Direction, Track};

    fn package() -> (CpuDevice, Arc<Track>, Arc<Track>) {
        let mut cpu = CpuDevice::new(1, Vec2::default());

        let (uart, gpio) = {
            let space = cpu.address_space_mut();
            space.add_device(MappedDevice::new(
                "Flash",
                0x0,
                Mmio::Memory(Memory::new(0x1000)),
            ));
            let uart = space.add_device(MappedDevice::new("UART", 0x1000, Mmio::Uart(Uart::new())));
            let gpio = space.add_device(MappedDevice::new("GPIO", 0x2000, Mmio::Gpio(Gpio::new())));
            (uart, gpio)
        };

        cpu.attach_pin(0, PinHandle::new(uart, 0));
        cpu.attach_pin(1, PinHandle::new(gpio, 0));

        let tx = Arc::new(Track::new(
            "tx",
            Direction::Mosi,
            true,
            DeviceId(0),
            DeviceId(1),
        ));
        let input = Arc::new(Track::new(
            "input",
            Direction::Miso,
            false,
            DeviceId(2),
            DeviceId(0),
        ));
        cpu.connector_mut().link_track("tx", Arc::clone(&tx));
        cpu.connector_mut().link_track("input", Arc::clone(&input));
        cpu.attach_pin_to_track(0, "tx");
        cpu.attach_pin_to_track(1, "input");

        (cpu, tx, input)
    }

    #[test]
    fn mosi_wiring_moves_pending_pin_values_onto_the_track() {
        let (mut cpu, tx, _input) = package();

        let handle = *cpu.pins.get(&0).unwrap();
        cpu.address_space_mut()
            .pin_mut(handle)
            .unwrap()
            .set(b'A');

        cpu.tick();

        assert_eq!(tx.get_value(), Some(b'A'));
    }

    #[test]
    fn miso_wiring_moves_pending_track_values_onto_the_pin() {
        let (mut cpu, _tx, input) = package();
        input.set_value(1);

        cpu.tick();

        let handle = *cpu.pins.get(&1).unwrap();
        assert_eq!(cpu.address_space_mut().pin_mut(handle).unwrap().take(), Some(1));
    }

    #[test]
    fn the_package_rests_once_every_core_halts() {
        let (mut cpu, _tx, _input) = package();
        assert!(!cpu.needs_update());

        cpu.reset();
        assert!(cpu.needs_update());

        // Executing from zeroed flash halts the core immediately.
        cpu.tick();
        assert!(!cpu.needs_update());
    }
}
