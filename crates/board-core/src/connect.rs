//! Connectable capability: named track bindings plus layout attributes.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::draw::Vec2;
use crate::track::Track;

/// Track-termination capability composed into each board device.
///
/// One component may terminate many named tracks. The position and size
/// attributes are consumed only by the rendering collaborator.
#[derive(Debug, Default)]
pub struct Connector {
    tracks: BTreeMap<String, Arc<Track>>,
    position: Vec2,
    size: Vec2,
}

impl Connector {
    /// Creates a connector with the given layout attributes.
    #[must_use]
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self {
            tracks: BTreeMap::new(),
            position,
            size,
        }
    }

    /// Binds a named track. The first registration for a name wins;
    /// duplicates are dropped silently.
    pub fn link_track(&mut self, name: &str, track: Arc<Track>) {
        self.tracks.entry(name.to_owned()).or_insert(track);
    }

    /// Looks up a bound track by name.
    #[must_use]
    pub fn track(&self, name: &str) -> Option<&Arc<Track>> {
        self.tracks.get(name)
    }

    /// Bound tracks in name order.
    pub fn tracks(&self) -> impl Iterator<Item = (&str, &Arc<Track>)> {
        self.tracks.iter().map(|(name, track)| (name.as_str(), track))
    }

    /// `true` when any bound track has a pending value.
    #[must_use]
    pub fn data_available(&self) -> bool {
        self.tracks.values().any(|track| track.has_value())
    }

    /// Layout position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Replaces the layout position.
    pub const fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Layout size.
    #[must_use]
    pub const fn size(&self) -> Vec2 {
        self.size
    }

    /// Replaces the layout size.
    pub const fn set_size(&mut self, size: Vec2) {
        self.size = size;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::Connector;
    use crate::devices::DeviceId;
    use crate::track::{Direction, Track};

    fn track(name: &str) -> Arc<Track> {
        Arc::new(Track::new(
            name,
            Direction::Mosi,
            false,
            DeviceId(0),
            DeviceId(1),
        ))
    }

    #[test]
    fn first_registration_for_a_name_wins() {
        let mut connector = Connector::default();
        let first = track("a");
        let second = track("a");

        connector.link_track("a", Arc::clone(&first));
        connector.link_track("a", second);

        assert!(Arc::ptr_eq(connector.track("a").unwrap(), &first));
    }

    #[test]
    fn data_availability_scans_every_bound_track() {
        let mut connector = Connector::default();
        let a = track("a");
        let b = track("b");
        connector.link_track("a", Arc::clone(&a));
        connector.link_track("b", Arc::clone(&b));

        assert!(!connector.data_available());
        b.set_value(1);
        assert!(connector.data_available());
    }

    #[test]
    fn tracks_iterate_in_name_order() {
        let mut connector = Connector::default();
        connector.link_track("zeta", track("zeta"));
        connector.link_track("alpha", track("alpha"));

        let names: Vec<&str> = connector.tracks().map(|(name, _)| name).collect();
        assert_eq!(names, ["alpha", "zeta"]);
    }
}
