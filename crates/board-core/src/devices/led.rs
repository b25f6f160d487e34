//! Single LED.

use crate::connect::Connector;
use crate::draw::{Color, Frame, Shape, Vec2};

const BODY: Color = Color::rgb(0xA0, 0xA0, 0xA0);
const LIT: Color = Color::rgb(0xA0, 0x10, 0x10);
const DARK: Color = Color::rgb(0x30, 0x10, 0x10);

/// An LED lit by the last nonzero level seen on any bound track.
#[derive(Debug)]
pub struct Led {
    connector: Connector,
    glowing: bool,
}

impl Led {
    /// Creates a dark LED at `position`.
    #[must_use]
    pub fn new(position: Vec2) -> Self {
        Self {
            connector: Connector::new(position, Vec2::new(20.0, 10.0)),
            glowing: false,
        }
    }

    /// `true` while the LED is lit.
    #[must_use]
    pub const fn is_glowing(&self) -> bool {
        self.glowing
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

    /// Consumes one pending level per bound track; nonzero lights the LED.
    pub fn tick(&mut self) {
        for (_, track) in self.connector.tracks() {
            if let Some(level) = track.get_value() {
                self.glowing = level != 0;
            }
        }
    }

    /// LEDs always participate in the sweep.
    #[must_use]
    pub const fn needs_update(&self) -> bool {
        true
    }

    /// Darkens the LED.
    pub const fn reset(&mut self) {
        self.glowing = false;
    }

    /// Renders the package and the lit/dark die.
    pub fn draw(&mut self, start: Vec2, frame: &mut Frame) {
        let min = start + self.connector.position();
        let max = min + self.connector.size();

        frame.push(Shape::Rect {
            min,
            max,
            color: BODY,
        });
        frame.push(Shape::Rect {
            min: min + Vec2::new(5.0, 0.0),
            max: max - Vec2::new(5.0, 0.0),
            color: if self.glowing { LIT } else { DARK },
        });
    }
}
