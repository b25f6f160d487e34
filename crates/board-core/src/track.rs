//! Named directional wires between board components.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::devices::DeviceId;

/// Signal direction of a track, fixed at creation.
///
/// Direction is advisory metadata: the track itself never enforces which
/// endpoint reads or writes. The wiring code inside each device's tick
/// decides, by direction, who drives and who samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Direction {
    /// Main-out, sub-in: the primary endpoint drives the wire.
    Mosi,
    /// Main-in, sub-out: the primary endpoint samples the wire.
    Miso,
}

#[derive(Debug)]
enum Slot {
    Latched(Option<u8>),
    Buffered(VecDeque<u8>),
}

/// A named wire between two board components.
///
/// Latched mode holds at most one pending byte: writes overwrite any
/// unread value and reads consume it. Buffered mode is an unbounded FIFO:
/// reads pop in write order. The queue is unbounded by design; a consumer
/// that never drains accumulates memory indefinitely, which the stock
/// board avoids by draining every tick or draw.
///
/// Every accessor takes the track's own lock, because a track's writer
/// (a device ticking on the worker thread) and its reader (a device
/// sampled on the presentation thread) run concurrently.
#[derive(Debug)]
pub struct Track {
    name: String,
    direction: Direction,
    buffered: bool,
    endpoints: (DeviceId, DeviceId),
    slot: Mutex<Slot>,
}

impl Track {
    pub(crate) fn new(
        name: impl Into<String>,
        direction: Direction,
        buffered: bool,
        from: DeviceId,
        to: DeviceId,
    ) -> Self {
        let slot = if buffered {
            Slot::Buffered(VecDeque::new())
        } else {
            Slot::Latched(None)
        };

        Self {
            name: name.into(),
            direction,
            buffered,
            endpoints: (from, to),
            slot: Mutex::new(slot),
        }
    }

    /// Name of the track.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Signal direction fixed at creation.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// `true` when the track queues values instead of latching one.
    #[must_use]
    pub const fn is_buffered(&self) -> bool {
        self.buffered
    }

    /// Endpoint device handles, for topology queries only.
    #[must_use]
    pub const fn endpoints(&self) -> (DeviceId, DeviceId) {
        self.endpoints
    }

    /// Writes a byte: overwrites the latched value or appends to the FIFO.
    pub fn set_value(&self, value: u8) {
        match &mut *self.lock() {
            Slot::Latched(slot) => *slot = Some(value),
            Slot::Buffered(queue) => queue.push_back(value),
        }
    }

    /// Consumes the pending value, oldest first in buffered mode.
    #[must_use]
    pub fn get_value(&self) -> Option<u8> {
        match &mut *self.lock() {
            Slot::Latched(slot) => slot.take(),
            Slot::Buffered(queue) => queue.pop_front(),
        }
    }

    /// `true` when a read would yield a value.
    #[must_use]
    pub fn has_value(&self) -> bool {
        match &*self.lock() {
            Slot::Latched(slot) => slot.is_some(),
            Slot::Buffered(queue) => !queue.is_empty(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
