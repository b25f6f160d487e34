//! Momentary push button.

use crate::connect::Connector;
use crate::draw::{Color, Frame, Shape, Vec2};

const BODY: Color = Color::rgb(0xA0, 0xA0, 0xA0);
const CAP_IDLE: Color = Color::rgb(0xA0, 0x20, 0x20);
const CAP_PRESSED: Color = Color::rgb(0x80, 0x20, 0x20);

/// A push button driving its bound tracks with its pressed level.
///
/// The pressed state is sampled from the frame input during `draw` — the
/// emulated world's only input path — and the next tick propagates it
/// onto every bound track.
#[derive(Debug)]
pub struct Button {
    connector: Connector,
    pressed: bool,
}

impl Button {
    /// Creates a released button at `position`.
    #[must_use]
    pub fn new(position: Vec2) -> Self {
        Self {
            connector: Connector::new(position, Vec2::new(31.0, 31.0)),
            pressed: false,
        }
    }

    /// `true` while the pointer holds the button down.
    #[must_use]
    pub const fn is_pressed(&self) -> bool {
        self.pressed
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

    /// Writes the pressed level (0/1) onto every bound track.
    pub fn tick(&mut self) {
        for (_, track) in self.connector.tracks() {
            track.set_value(u8::from(self.pressed));
        }
    }

    /// Buttons always participate in the sweep.
    #[must_use]
    pub const fn needs_update(&self) -> bool {
        true
    }

    /// Releases the button.
    pub const fn reset(&mut self) {
        self.pressed = false;
    }

    /// Samples the frame input, then renders the body and cap.
    pub fn draw(&mut self, start: Vec2, frame: &mut Frame) {
        let min = start + self.connector.position();
        let max = min + self.connector.size();

        self.pressed = frame.hovered(min, max) && frame.input().primary_down;

        frame.push(Shape::Rect {
            min,
            max,
            color: BODY,
        });
        frame.push(Shape::Circle {
            center: min + self.connector.size() * 0.5,
            radius: 9.0,
            color: if self.pressed { CAP_PRESSED } else { CAP_IDLE },
        });
    }
}
