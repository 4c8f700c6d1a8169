//! The decoded navigation snapshot shared with downstream consumers.

use serde::Serialize;

use crate::geo::Position;
use crate::traffic::TrafficTable;
use crate::types::AlarmLevel;

/// Decoded receiver/sensor snapshot for one device session.
///
/// Created once at session start and mutated incrementally: every decoder
/// overwrites only the fields its sentence actually carries, so a sentence
/// omitting an optional field never wipes previously valid data. Auxiliary
/// sensor fields stay `None` until the matching vendor sentence shows up.
#[derive(Debug, Clone, Serialize)]
pub struct NavigationState {
    // Primary fix
    pub latitude: f64,
    pub longitude: f64,
    /// GNSS altitude, metres.
    pub altitude_m: f64,
    pub ground_speed_ms: f64,
    pub track_deg: f64,
    /// Fix time, seconds within the UTC day.
    pub time_of_day: f64,
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub satellites: u32,

    // Validity
    /// A primary fix sentence has been received this session.
    pub connected: bool,
    pub fix_valid: bool,
    pub date_valid: bool,

    // Auxiliary sensors (vendor sentences)
    pub baro_altitude_m: Option<f64>,
    pub vertical_speed_ms: Option<f64>,
    pub true_airspeed_ms: Option<f64>,
    pub heading_deg: Option<f64>,

    // Proximity traffic
    pub traffic_status: TrafficStatus,
    pub traffic: TrafficTable,
}

impl NavigationState {
    pub fn new() -> Self {
        NavigationState {
            latitude: 0.0,
            longitude: 0.0,
            altitude_m: 0.0,
            ground_speed_ms: 0.0,
            track_deg: 0.0,
            time_of_day: 0.0,
            year: 0,
            month: 0,
            day: 0,
            satellites: 0,
            connected: false,
            fix_valid: false,
            date_valid: false,
            baro_altitude_m: None,
            vertical_speed_ms: None,
            true_airspeed_ms: None,
            heading_deg: None,
            traffic_status: TrafficStatus::default(),
            traffic: TrafficTable::new(),
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.latitude, self.longitude)
    }
}

impl Default for NavigationState {
    fn default() -> Self {
        NavigationState::new()
    }
}

/// Health and alarm summary of the attached traffic radio.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrafficStatus {
    /// A proximity sentence arrived recently.
    pub available: bool,
    /// Number of devices the radio currently receives.
    pub rx_count: u32,
    pub tx_ok: bool,
    pub gps_ok: bool,
    /// Own-ship alarm level from the status sentence.
    pub alarm: AlarmLevel,
    pub hardware_version: Option<String>,
    pub software_version: Option<String>,
    pub obstacle_version: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
