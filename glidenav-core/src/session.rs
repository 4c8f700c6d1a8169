//! Per-device parsing session.
//!
//! Owns everything the decoders need between lines: per-family fix times,
//! the continuous fix timeline (with midnight rollover), the last-valid-fix
//! timer, the pressure-altitude heartbeat counter, and the tangent-plane
//! reference for traffic projection. One session per connected device;
//! `reset()` is the explicit, idempotent reconnect call.
//!
//! Decoding is synchronous and non-blocking. The caller merges the session
//! state into whatever shared snapshot other subsystems read; `poll()` is
//! the once-per-consumer-cycle maintenance entry point.

use crate::geo::{TangentPlane, PLANE_DRIFT_M};
use crate::sentences::{classify, SentenceId};
use crate::state::NavigationState;
use crate::tokenizer;
use crate::types::Result;

/// Fix validity is dropped after this many seconds without an accepted fix.
pub const FIX_STALE_SEC: f64 = 6.0;

/// Traffic radio is considered detached after this long without any
/// proximity sentence.
pub const RADIO_STALE_SEC: f64 = 15.0;

/// Apparent time regressions larger than this are midnight rollovers.
const ROLLOVER_SEC: f64 = 43_200.0;

const DAY_SEC: f64 = 86_400.0;

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Static device capabilities declared at attach time.
#[derive(Debug, Clone, Copy)]
pub struct SessionCaps {
    /// This device is the declared pressure-altitude source; when false,
    /// vendor pressure-altitude sentences are parsed but never applied.
    pub baro_source: bool,
    /// Number of pressure-altitude sentences ignored after attach/reset
    /// before the value is trusted.
    pub baro_gate: u16,
    /// Device exposes a vendor position API beside the wire sentences.
    pub vendor_position: bool,
}

impl Default for SessionCaps {
    fn default() -> Self {
        SessionCaps {
            baro_source: true,
            baro_gate: 3,
            vendor_position: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of processing one well-formed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Sentence decoded and applied.
    Updated(SentenceId),
    /// Field-level parse succeeded but the embedded time regressed, so the
    /// position/velocity payload was discarded.
    Stale(SentenceId),
    /// Unknown sentence code — a no-op, not an error.
    Ignored,
}

/// Diagnostic hook: `(source, raw line, accepted)` for every processed line.
pub type LineHook = Box<dyn FnMut(&str, &str, bool) + Send>;

// ---------------------------------------------------------------------------
// ParserSession
// ---------------------------------------------------------------------------

pub struct ParserSession {
    source: String,
    pub(crate) caps: SessionCaps,

    // Last accepted fix time (seconds within day) per sentence family.
    pub(crate) gga_time: Option<f64>,
    pub(crate) rmc_time: Option<f64>,
    pub(crate) gll_time: Option<f64>,

    // Continuous timeline across all fix-bearing families.
    last_time: f64,
    day_offset: u32,

    // Monotonic instants, caller-supplied.
    pub(crate) last_fix_at: Option<f64>,
    pub(crate) radio_seen_at: Option<f64>,

    pub(crate) rmz_count: u32,
    pub(crate) plane: Option<TangentPlane>,

    line_hook: Option<LineHook>,
}

impl ParserSession {
    pub fn new(source: impl Into<String>) -> Self {
        ParserSession::with_caps(source, SessionCaps::default())
    }

    pub fn with_caps(source: impl Into<String>, caps: SessionCaps) -> Self {
        ParserSession {
            source: source.into(),
            caps,
            gga_time: None,
            rmc_time: None,
            gll_time: None,
            last_time: -1.0,
            day_offset: 0,
            last_fix_at: None,
            radio_seen_at: None,
            rmz_count: 0,
            plane: None,
            line_hook: None,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn caps(&self) -> SessionCaps {
        self.caps
    }

    /// Accumulated midnight rollovers on this session's timeline.
    pub fn day_rollovers(&self) -> u32 {
        self.day_offset
    }

    /// Which fix families have delivered an accepted fix this session:
    /// `(gga, rmc, gll)`.
    pub fn fix_sources(&self) -> (bool, bool, bool) {
        (
            self.gga_time.is_some(),
            self.rmc_time.is_some(),
            self.gll_time.is_some(),
        )
    }

    /// Install the raw-line diagnostic hook. The logging mechanism itself
    /// lives outside this crate.
    pub fn set_line_hook(&mut self, hook: LineHook) {
        self.line_hook = Some(hook);
    }

    /// Clear all parsing state. Idempotent; invoked on reconnect. Keeps the
    /// source name, capabilities, and diagnostic hook.
    pub fn reset(&mut self) {
        self.gga_time = None;
        self.rmc_time = None;
        self.gll_time = None;
        self.last_time = -1.0;
        self.day_offset = 0;
        self.last_fix_at = None;
        self.radio_seen_at = None;
        self.rmz_count = 0;
        self.plane = None;
    }

    /// Process one raw line against the navigation state.
    ///
    /// `now` is a caller-supplied monotonic timestamp in seconds; it feeds
    /// the fix-staleness timer and traffic slot ages.
    pub fn parse_line(
        &mut self,
        line: &str,
        now: f64,
        state: &mut NavigationState,
    ) -> Result<Outcome> {
        let result = self.dispatch(line, now, state);
        if let Some(hook) = &mut self.line_hook {
            hook(&self.source, line, result.is_ok());
        }
        result
    }

    fn dispatch(&mut self, line: &str, now: f64, state: &mut NavigationState) -> Result<Outcome> {
        let fields = tokenizer::tokenize(line)?;
        let id = match fields.get(0).and_then(classify) {
            Some(id) => id,
            None => return Ok(Outcome::Ignored),
        };
        match id {
            SentenceId::Gga => self.gga(&fields, now, state),
            SentenceId::Rmc => self.rmc(&fields, now, state),
            SentenceId::Gll => self.gll(&fields, now, state),
            SentenceId::Gsa => self.gsa(&fields, now, state),
            SentenceId::Vtg => self.vtg(&fields, now, state),
            SentenceId::PressureAlt => self.pressure_alt(&fields, now, state),
            SentenceId::AirData => self.air_data(&fields, now, state),
            SentenceId::Heading => self.heading(&fields, now, state),
            SentenceId::Airspeed => self.airspeed(&fields, now, state),
            SentenceId::TrafficStatus => self.traffic_status(&fields, now, state),
            SentenceId::TrafficContact => self.traffic_contact(&fields, now, state),
            SentenceId::RadioVersion => self.radio_version(&fields, now, state),
        }
    }

    /// Per-cycle maintenance: fix staleness, radio availability, traffic
    /// aging, tangent-plane upkeep. Invoke exactly once per consumer cycle;
    /// this is a pollable condition, not an event.
    pub fn poll(&mut self, now: f64, state: &mut NavigationState) {
        if let Some(t) = self.last_fix_at {
            if now - t > FIX_STALE_SEC {
                state.fix_valid = false;
                self.last_fix_at = None;
            }
        }
        if let Some(t) = self.radio_seen_at {
            if now - t > RADIO_STALE_SEC {
                state.traffic_status.available = false;
                self.radio_seen_at = None;
            }
        }
        state.traffic.refresh(now);

        if state.fix_valid {
            let pos = state.position();
            let drifted = match &self.plane {
                Some(plane) => plane.drift_m(pos) > PLANE_DRIFT_M,
                None => true,
            };
            if drifted {
                self.plane = Some(TangentPlane::new(pos));
            }
        }
    }

    /// Vendor position-API path: feed a position sample that did not come
    /// over the wire. Subject to the same time-advancement and fix-validity
    /// bookkeeping as the wire decoders. Returns whether the sample was
    /// applied; a session without the capability never applies it.
    pub fn inject_position(
        &mut self,
        latitude: f64,
        longitude: f64,
        altitude_m: f64,
        time_of_day: f64,
        now: f64,
        state: &mut NavigationState,
    ) -> bool {
        if !self.caps.vendor_position {
            return false;
        }
        if self.advance_time(time_of_day).is_none() {
            return false;
        }
        state.connected = true;
        state.latitude = latitude;
        state.longitude = longitude;
        state.altitude_m = altitude_m;
        state.time_of_day = time_of_day;
        self.note_valid_fix(now, state);
        true
    }

    /// Advance the session timeline to a new seconds-within-day value.
    ///
    /// Accepts any time not earlier than the last accepted one; a regression
    /// of more than half a day is a midnight rollover. Returns the
    /// continuous time, or `None` when the payload must be discarded.
    pub(crate) fn advance_time(&mut self, time_of_day: f64) -> Option<f64> {
        let mut t = self.day_offset as f64 * DAY_SEC + time_of_day;
        if self.last_time >= 0.0 && t < self.last_time {
            if self.last_time - t > ROLLOVER_SEC {
                self.day_offset += 1;
                t += DAY_SEC;
            } else {
                return None;
            }
        }
        self.last_time = t;
        Some(t)
    }

    pub(crate) fn note_valid_fix(&mut self, now: f64, state: &mut NavigationState) {
        self.last_fix_at = Some(now);
        state.fix_valid = true;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
