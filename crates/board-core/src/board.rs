//! Board: device and track ownership plus the power-up scheduling loop.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::devices::{BoardDevice, DeviceId};
use crate::draw::{Color, Frame, Shape, Vec2};
use crate::track::{Direction, Track};

const SUBSTRATE: Color = Color::rgb(0x09, 0x91, 0x32);
const TRACE: Color = Color::rgb(0x19, 0xC1, 0x62);

/// Result of one `power_up` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerOutcome {
    /// A full sweep produced no work.
    Converged,
    /// The power flag was cleared between sweeps.
    PoweredDown,
    /// The configured sweep cap was reached with work still pending.
    DidNotConverge,
}

/// Cloneable handle that cuts board power from another thread.
///
/// Power-down is cooperative: the sweep loop observes the cleared flag at
/// its next between-sweeps check, so some additional ticks may run first.
#[derive(Debug, Clone)]
pub struct PowerSwitch {
    power: Arc<AtomicBool>,
}

impl PowerSwitch {
    /// Clears the power flag.
    pub fn power_down(&self) {
        self.power.store(false, Ordering::SeqCst);
    }
}

/// The board: owns every device and track, wires them together at
/// construction, and runs the power-up convergence loop.
///
/// Devices and tracks are created once and live for the board's lifetime.
/// Dropping a board powers it down; a caller running `power_up` on a
/// worker thread must join that worker before the board goes away.
#[derive(Debug)]
pub struct Board {
    name: String,
    power: Arc<AtomicBool>,
    devices: Vec<BoardDevice>,
    tracks: BTreeMap<String, Arc<Track>>,
    convergence_cap: Option<u64>,
    position: Vec2,
    dimensions: Vec2,
}

impl Board {
    /// Creates an unpowered board with no devices or tracks.
    #[must_use]
    pub fn new(name: impl Into<String>, dimensions: Vec2) -> Self {
        Self {
            name: name.into(),
            power: Arc::new(AtomicBool::new(false)),
            devices: Vec::new(),
            tracks: BTreeMap::new(),
            convergence_cap: None,
            position: Vec2::default(),
            dimensions,
        }
    }

    /// Caps the number of sweeps one `power_up` call may run.
    ///
    /// Uncapped boards whose devices keep re-triggering each other sweep
    /// until power-down; the cap turns that into a reportable
    /// [`PowerOutcome::DidNotConverge`].
    #[must_use]
    pub fn with_convergence_cap(mut self, cap: u64) -> Self {
        self.convergence_cap = Some(cap);
        self
    }

    /// Replaces the sweep cap.
    pub const fn set_convergence_cap(&mut self, cap: Option<u64>) {
        self.convergence_cap = cap;
    }

    /// Name of the board.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `true` while the power flag is set.
    #[must_use]
    pub fn is_powered(&self) -> bool {
        self.power.load(Ordering::SeqCst)
    }

    /// A handle that can cut power from another thread.
    #[must_use]
    pub fn power_switch(&self) -> PowerSwitch {
        PowerSwitch {
            power: Arc::clone(&self.power),
        }
    }

    /// Adds a device; the returned handle stays valid for the board's
    /// lifetime.
    pub fn add_device(&mut self, device: BoardDevice) -> DeviceId {
        self.devices.push(device);
        DeviceId(self.devices.len() - 1)
    }

    /// The device behind a handle.
    #[must_use]
    pub fn device(&self, id: DeviceId) -> &BoardDevice {
        &self.devices[id.0]
    }

    /// The device behind a handle, mutably.
    pub fn device_mut(&mut self, id: DeviceId) -> &mut BoardDevice {
        &mut self.devices[id.0]
    }

    /// Creates a named track between two devices and links it into both
    /// endpoints' connectors. Idempotent per name: a second track with
    /// the same name is silently dropped.
    pub fn create_track(
        &mut self,
        direction: Direction,
        name: &str,
        from: DeviceId,
        to: DeviceId,
        buffered: bool,
    ) {
        if self.tracks.contains_key(name) {
            return;
        }

        let track = Arc::new(Track::new(name, direction, buffered, from, to));
        self.tracks.insert(name.to_owned(), Arc::clone(&track));
        self.devices[from.0]
            .connector_mut()
            .link_track(name, Arc::clone(&track));
        self.devices[to.0].connector_mut().link_track(name, track);
    }

    /// Looks up a track by name.
    #[must_use]
    pub fn track(&self, name: &str) -> Option<&Arc<Track>> {
        self.tracks.get(name)
    }

    /// Powers the board: resets every device, then sweeps the device
    /// list, ticking each device that reports pending work, until a full
    /// sweep does no work or power is cut.
    ///
    /// The power flag is checked between sweeps, not mid-sweep; an
    /// in-progress sweep always completes.
    pub fn power_up(&mut self) -> PowerOutcome {
        self.power.store(true, Ordering::SeqCst);

        for device in &mut self.devices {
            device.reset();
        }

        let mut sweeps = 0_u64;
        loop {
            let mut done_work = false;
            for device in &mut self.devices {
                if device.needs_update() {
                    device.tick();
                    done_work = true;
                }
            }

            if !done_work {
                return PowerOutcome::Converged;
            }
            if !self.power.load(Ordering::SeqCst) {
                return PowerOutcome::PoweredDown;
            }

            sweeps += 1;
            if let Some(cap) = self.convergence_cap {
                if sweeps >= cap {
                    log::warn!("power-up loop did not converge after {cap} sweeps");
                    return PowerOutcome::DidNotConverge;
                }
            }
        }
    }

    /// Clears the power flag; does not interrupt an in-progress sweep.
    pub fn power_down(&self) {
        self.power.store(false, Ordering::SeqCst);
    }

    /// Layout position of the board.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Replaces the layout position.
    pub const fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Layout dimensions of the board.
    #[must_use]
    pub const fn dimensions(&self) -> Vec2 {
        self.dimensions
    }

    /// Renders the substrate, the track routing, then every device's
    /// draw hook.
    pub fn draw(&mut self, frame: &mut Frame) {
        frame.push(Shape::Rect {
            min: self.position,
            max: self.position + self.dimensions,
            color: SUBSTRATE,
        });

        for track in self.tracks.values() {
            let (from, to) = track.endpoints();
            let from_connector = self.devices[from.0].connector();
            let to_connector = self.devices[to.0].connector();

            let start = self.position + from_connector.position() + from_connector.size() * 0.5;
            let end = self.position + to_connector.position() + to_connector.size() * 0.5;
            let elbow = if start.x - self.position.x > start.y - self.position.y {
                Vec2::new(start.x, end.y)
            } else {
                Vec2::new(end.x, start.y)
            };

            frame.push(Shape::Line {
                from: start,
                to: elbow,
                color: TRACE,
                thickness: 3.0,
            });
            frame.push(Shape::Line {
                from: elbow,
                to: end,
                color: TRACE,
                thickness: 3.0,
            });
        }

        for device in &mut self.devices {
            device.draw(self.position, frame);
        }
    }
}

impl Drop for Board {
    fn drop(&mut self) {
        self.power_down();
    }
}
