//! Pin header exposing tracks to the outside world.

use std::collections::BTreeMap;

use crate::connect::Connector;
use crate::draw::{Color, Frame, Shape, Vec2};

const BODY: Color = Color::rgb(0x10, 0x10, 0x10);
const PIN: Color = Color::rgb(0xB0, 0xB0, 0xC0);
const LABEL: Color = Color::rgb(0xFF, 0xFF, 0xFF);

const PIN_PITCH: f32 = 19.0;

/// A header that terminates tracks and records what arrives on them.
///
/// The header never ticks; it drains one pending byte per bound track
/// during each draw into a per-track received string, acting as the
/// board's console sink.
#[derive(Debug)]
pub struct PinHeader {
    connector: Connector,
    received: BTreeMap<String, String>,
}

impl PinHeader {
    /// Creates an empty header at `position`.
    #[must_use]
    pub fn new(position: Vec2) -> Self {
        Self {
            connector: Connector::new(position, Vec2::new(PIN_PITCH, PIN_PITCH)),
            received: BTreeMap::new(),
        }
    }

    /// Bytes received so far on a named track.
    #[must_use]
    pub fn received(&self, track: &str) -> Option<&str> {
        self.received.get(track).map(String::as_str)
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

    /// Headers do no scheduled work of their own.
    pub const fn tick(&mut self) {}

    /// `true` while any bound track has undrained data.
    #[must_use]
    pub fn needs_update(&self) -> bool {
        self.connector.data_available()
    }

    /// Forgets everything received.
    pub fn reset(&mut self) {
        self.received.clear();
    }

    /// Renders the header and drains one byte per bound track.
    pub fn draw(&mut self, start: Vec2, frame: &mut Frame) {
        let pins = self.connector.tracks().count().max(1);
        self.connector
            .set_size(Vec2::new(PIN_PITCH * pins as f32, PIN_PITCH));

        let min = start + self.connector.position();
        let max = min + self.connector.size();

        frame.push(Shape::Rect {
            min,
            max,
            color: BODY,
        });
        for index in 0..pins {
            frame.push(Shape::Circle {
                center: min + Vec2::new(9.0 + PIN_PITCH * index as f32, 10.0),
                radius: 4.0,
                color: PIN,
            });
        }

        for (name, track) in self.connector.tracks() {
            if let Some(value) = track.get_value() {
                self.received
                    .entry(name.to_owned())
                    .or_default()
                    .push(char::from(value));
            }
        }

        if frame.hovered(min, max) {
            for (index, (name, text)) in self.received.iter().enumerate() {
                frame.push(Shape::Text {
                    pos: max + Vec2::new(0.0, PIN_PITCH * index as f32),
                    color: LABEL,
                    text: format!("{name}: {text}"),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::PinHeader;
    use crate::devices::DeviceId;
    use crate::draw::{Frame, Vec2};
    use crate::track::{Direction, Track};

    fn wired_header() -> (PinHeader, Arc<Track>) {
        let mut header = PinHeader::new(Vec2::default());
        let track = Arc::new(Track::new(
            "uarta_tx",
            Direction::Mosi,
            true,
            DeviceId(0),
            DeviceId(1),
        ));
        header
            .connector_mut()
            .link_track("uarta_tx", Arc::clone(&track));
        (header, track)
    }

    #[test]
    fn draw_drains_one_byte_per_track_into_the_received_string() {
        let (mut header, track) = wired_header();
        track.set_value(b'h');
        track.set_value(b'i');

        let mut frame = Frame::default();
        header.draw(Vec2::default(), &mut frame);
        assert_eq!(header.received("uarta_tx"), Some("h"));

        let mut frame = Frame::default();
        header.draw(Vec2::default(), &mut frame);
        assert_eq!(header.received("uarta_tx"), Some("hi"));
    }

    #[test]
    fn pending_data_keeps_the_header_scheduled() {
        let (header, track) = wired_header();
        assert!(!header.needs_update());

        track.set_value(1);
        assert!(header.needs_update());
    }

    #[test]
    fn reset_forgets_received_data() {
        let (mut header, track) = wired_header();
        track.set_value(b'x');
        header.draw(Vec2::default(), &mut Frame::default());
        assert_eq!(header.received("uarta_tx"), Some("x"));

        header.reset();
        assert_eq!(header.received("uarta_tx"), None);
    }
}
