//! Fixed-capacity table of nearby traffic contacts.
//!
//! Keyed by radio identifier. Contacts are created on first sighting,
//! updated in place on repeats, flagged stale and finally cleared when the
//! radio stops reporting them. When the table is full a new identifier
//! evicts the least-recently-updated slot — expected steady-state under
//! high contact density, never an error.

use serde::Serialize;

use crate::geo::Position;
use crate::types::{AlarmLevel, RadioId};

/// Maximum tracked contacts.
pub const MAX_TRAFFIC: usize = 50;

/// Age after which a slot is flagged stale (still enumerated).
pub const TRAFFIC_STALE_SEC: f64 = 15.0;

/// Age after which a slot is cleared back to empty.
pub const TRAFFIC_PURGE_SEC: f64 = 30.0;

/// One tracked proximity contact.
///
/// Offsets are the tangent-plane frame of the reporting radio: metres
/// north/east of own ship, metres above own ship. Motion fields stay
/// `None` for contacts that withhold them.
#[derive(Debug, Clone, Serialize)]
pub struct TrafficSlot {
    pub radio_id: RadioId,
    pub alarm: AlarmLevel,
    pub north_m: f64,
    pub east_m: f64,
    pub vertical_m: f64,
    /// Absolute coordinates, projected from the offsets when own position
    /// was known at update time.
    pub position: Option<Position>,
    pub track_deg: Option<f64>,
    pub turn_rate_dps: Option<f64>,
    pub speed_ms: Option<f64>,
    pub climb_ms: Option<f64>,
    pub aircraft_type: u8,
    pub last_update: f64,
    pub stale: bool,
}

impl TrafficSlot {
    fn new(radio_id: RadioId, now: f64) -> Self {
        TrafficSlot {
            radio_id,
            alarm: AlarmLevel::None,
            north_m: 0.0,
            east_m: 0.0,
            vertical_m: 0.0,
            position: None,
            track_deg: None,
            turn_rate_dps: None,
            speed_ms: None,
            climb_ms: None,
            aircraft_type: 0,
            last_update: now,
            stale: false,
        }
    }

    pub fn age(&self, now: f64) -> f64 {
        now - self.last_update
    }
}

/// Fixed-capacity associative table keyed by radio identifier.
#[derive(Debug, Clone, Serialize)]
pub struct TrafficTable {
    #[serde(serialize_with = "occupied_only")]
    slots: [Option<TrafficSlot>; MAX_TRAFFIC],
    stale_after: f64,
    purge_after: f64,
}

fn occupied_only<S>(
    slots: &[Option<TrafficSlot>; MAX_TRAFFIC],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(slots.iter().flatten())
}

impl TrafficTable {
    pub fn new() -> Self {
        TrafficTable::with_windows(TRAFFIC_STALE_SEC, TRAFFIC_PURGE_SEC)
    }

    pub fn with_windows(stale_after: f64, purge_after: f64) -> Self {
        TrafficTable {
            slots: std::array::from_fn(|_| None),
            stale_after,
            purge_after,
        }
    }

    /// Slot index for an identifier, if tracked.
    pub fn find(&self, radio_id: RadioId) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|s| s.radio_id == radio_id))
    }

    pub fn get(&self, radio_id: RadioId) -> Option<&TrafficSlot> {
        self.find(radio_id).and_then(|i| self.slots[i].as_ref())
    }

    /// Find-or-create: existing slot for the identifier, or a fresh one in
    /// the first empty position. A full table evicts the slot with the
    /// oldest update time.
    pub fn slot_for(&mut self, radio_id: RadioId, now: f64) -> &mut TrafficSlot {
        let idx = match self.find(radio_id) {
            Some(i) => i,
            None => self.allocate(),
        };
        self.slots[idx].get_or_insert_with(|| TrafficSlot::new(radio_id, now))
    }

    fn allocate(&mut self) -> usize {
        if let Some(i) = self.slots.iter().position(|s| s.is_none()) {
            return i;
        }
        let mut oldest = 0;
        let mut oldest_time = f64::INFINITY;
        for (i, slot) in self.slots.iter().enumerate() {
            if let Some(s) = slot {
                if s.last_update < oldest_time {
                    oldest_time = s.last_update;
                    oldest = i;
                }
            }
        }
        self.slots[oldest] = None;
        oldest
    }

    /// Age out contacts. Invoked once per consumer cycle, not per sentence,
    /// so staleness timing is independent of traffic-message rate.
    pub fn refresh(&mut self, now: f64) {
        for slot in &mut self.slots {
            if let Some(s) = slot {
                let age = s.age(now);
                if age > self.purge_after {
                    *slot = None;
                } else {
                    s.stale = age > self.stale_after;
                }
            }
        }
    }

    /// Lazy, restartable iterator over occupied slots.
    pub fn iter(&self) -> impl Iterator<Item = &TrafficSlot> {
        self.slots.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.is_none())
    }

    pub fn capacity(&self) -> usize {
        MAX_TRAFFIC
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
    }
}

impl Default for TrafficTable {
    fn default() -> Self {
        TrafficTable::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
