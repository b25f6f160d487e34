//! Closed set of schedulable board components.
//!
//! Scheduling (`tick`/`needs_update`/`reset`) and track termination
//! ([`Connector`]) are independent capabilities carried by the same
//! concrete types; the set itself is a closed tagged variant where each
//! variant owns only the state it needs.

mod button;
mod cpu;
mod led;
mod pin_header;

pub use button::Button;
pub use cpu::CpuDevice;
pub use led::Led;
pub use pin_header::PinHeader;

use crate::connect::Connector;
use crate::draw::{Frame, Vec2};

/// Stable handle of a device within its owning board.
///
/// Cross-references between board objects (track endpoints, wiring
/// tables) are expressed as these handles and resolved through the board,
/// never as borrowed pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(pub(crate) usize);

/// Closed set of board devices.
#[derive(Debug)]
pub enum BoardDevice {
    /// CPU package with its own address space and cores.
    Cpu(CpuDevice),
    /// Momentary push button.
    Button(Button),
    /// Single LED.
    Led(Led),
    /// Pin header exposing tracks to the outside world.
    PinHeader(PinHeader),
}

impl BoardDevice {
    /// One scheduling step.
    pub fn tick(&mut self) {
        match self {
            Self::Cpu(device) => device.tick(),
            Self::Button(device) => device.tick(),
            Self::Led(device) => device.tick(),
            Self::PinHeader(device) => device.tick(),
        }
    }

    /// `true` when the next sweep should tick this device.
    #[must_use]
    pub fn needs_update(&self) -> bool {
        match self {
            Self::Cpu(device) => device.needs_update(),
            Self::Button(device) => device.needs_update(),
            Self::Led(device) => device.needs_update(),
            Self::PinHeader(device) => device.needs_update(),
        }
    }

    /// Returns the device to its power-on state.
    pub fn reset(&mut self) {
        match self {
            Self::Cpu(device) => device.reset(),
            Self::Button(device) => device.reset(),
            Self::Led(device) => device.reset(),
            Self::PinHeader(device) => device.reset(),
        }
    }

    /// The device's track-termination capability.
    #[must_use]
    pub fn connector(&self) -> &Connector {
        match self {
            Self::Cpu(device) => device.connector(),
            Self::Button(device) => device.connector(),
            Self::Led(device) => device.connector(),
            Self::PinHeader(device) => device.connector(),
        }
    }

    /// The device's track-termination capability, for wiring.
    pub fn connector_mut(&mut self) -> &mut Connector {
        match self {
            Self::Cpu(device) => device.connector_mut(),
            Self::Button(device) => device.connector_mut(),
            Self::Led(device) => device.connector_mut(),
            Self::PinHeader(device) => device.connector_mut(),
        }
    }

    /// Draw hook; `start` is the board origin.
    pub fn draw(&mut self, start: Vec2, frame: &mut Frame) {
        match self {
            Self::Cpu(device) => device.draw(start, frame),
            Self::Button(device) => device.draw(start, frame),
            Self::Led(device) => device.draw(start, frame),
            Self::PinHeader(device) => device.draw(start, frame),
        }
    }
}
