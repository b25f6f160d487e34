//! The stock demo board topology.
//!
//! One single-core CPU with flash, RAM, a UART, and a GPIO bank, wired to
//! a pin header (UART console), a button (GPIO input), and an LED (GPIO
//! output). The kernel image is loaded separately by the caller, through
//! [`crate::loader`].

use crate::board::Board;
use crate::bus::{MappedDevice, PinHandle};
use crate::devices::{BoardDevice, Button, CpuDevice, DeviceId, Led, PinHeader};
use crate::draw::Vec2;
use crate::mmio::{Gpio, Memory, Mmio, Uart};
use crate::track::Direction;

/// Track carrying UART A's TX bytes to the pin header.
pub const UART_TRACK: &str = "uarta_tx";
/// Track carrying button A's level to GPIO pin 0.
pub const BUTTON_TRACK: &str = "buttona";
/// Track driving LED A from GPIO pin 1.
pub const LED_TRACK: &str = "leda";

/// Base address of the flash image.
pub const FLASH_BASE: u64 = 0x0000_0000;
/// Base address of working RAM.
pub const RAM_BASE: u64 = 0x1000_0000;
/// Base address of UART A.
pub const UART_BASE: u64 = 0x5000_0000;
/// Base address of GPIO bank A.
pub const GPIO_BASE: u64 = 0x6000_0000;

const MIB: usize = 1024 * 1024;

/// The demo board plus handles to its devices.
#[derive(Debug)]
pub struct DemoBoard {
    /// The wired board.
    pub board: Board,
    /// The CPU package.
    pub cpu: DeviceId,
    /// The UART console header.
    pub uart_header: DeviceId,
    /// Button A.
    pub button: DeviceId,
    /// LED A.
    pub led: DeviceId,
}

/// Builds the stock single-CPU board with its fixed track wiring.
#[must_use]
pub fn demo_board() -> DemoBoard {
    let mut board = Board::new("Test Board", Vec2::new(500.0, 300.0));

    let mut cpu = CpuDevice::new(1, Vec2::new(50.0, 50.0));
    let (uart, gpio) = {
        let space = cpu.address_space_mut();
        space.add_device(MappedDevice::new(
            "Flash",
            FLASH_BASE,
            Mmio::Memory(Memory::new(MIB)),
        ));
        space.add_device(MappedDevice::new(
            "RAM",
            RAM_BASE,
            Mmio::Memory(Memory::new(2 * MIB)),
        ));
        let uart = space.add_device(MappedDevice::new("UART", UART_BASE, Mmio::Uart(Uart::new())));
        let gpio = space.add_device(MappedDevice::new("GPIO", GPIO_BASE, Mmio::Gpio(Gpio::new())));
        (uart, gpio)
    };

    cpu.attach_pin(0, PinHandle::new(uart, 0));
    cpu.attach_pin(1, PinHandle::new(gpio, 0));
    cpu.attach_pin(2, PinHandle::new(gpio, 1));
    cpu.attach_pin_to_track(0, UART_TRACK);
    cpu.attach_pin_to_track(1, BUTTON_TRACK);
    cpu.attach_pin_to_track(2, LED_TRACK);

    let cpu = board.add_device(BoardDevice::Cpu(cpu));
    let uart_header = board.add_device(BoardDevice::PinHeader(PinHeader::new(Vec2::new(
        200.0, 250.0,
    ))));
    let button = board.add_device(BoardDevice::Button(Button::new(Vec2::new(300.0, 250.0))));
    let led = board.add_device(BoardDevice::Led(Led::new(Vec2::new(100.0, 200.0))));

    board.create_track(Direction::Mosi, UART_TRACK, cpu, uart_header, true);
    board.create_track(Direction::Miso, BUTTON_TRACK, cpu, button, false);
    board.create_track(Direction::Mosi, LED_TRACK, cpu, led, false);

    DemoBoard {
        board,
        cpu,
        uart_header,
        button,
        led,
    }
}

#[cfg(test)]
mod tests {
    use super::{demo_board, BUTTON_TRACK, LED_TRACK, UART_TRACK};
    use crate::devices::BoardDevice;
    use crate::track::Direction;

    #[test]
    fn the_fixed_topology_matches_the_stock_board() {
        let demo = demo_board();

        let tx = demo.board.track(UART_TRACK).expect("uart track");
        assert_eq!(tx.direction(), Direction::Mosi);
        assert!(tx.is_buffered());

        let button = demo.board.track(BUTTON_TRACK).expect("button track");
        assert_eq!(button.direction(), Direction::Miso);
        assert!(!button.is_buffered());

        let led = demo.board.track(LED_TRACK).expect("led track");
        assert_eq!(led.direction(), Direction::Mosi);
        assert!(!led.is_buffered());

        let BoardDevice::Cpu(cpu) = demo.board.device(demo.cpu) else {
            panic!("expected the CPU package");
        };
        assert_eq!(cpu.cores().len(), 1);
        assert_eq!(cpu.address_space().devices().len(), 4);
    }
}
