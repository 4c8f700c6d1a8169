//! Sentence classification and the per-sentence decoders.
//!
//! Standard sentences are recognized by their trailing three-letter code so
//! any talker prefix works; proprietary sentences match a lookup table.
//! Every decoder applies a sparse update: missing or empty fields leave the
//! navigation state untouched, never write zeros.

use crate::session::{Outcome, ParserSession};
use crate::state::NavigationState;
use crate::tokenizer::Fields;
use crate::types::{radio_id_from_hex, AlarmLevel, NavError, Result};
use crate::units::{parse_altitude, FEET_TO_M, KMH_TO_MS, KNOTS_TO_MS};

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Consumed sentence families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceId {
    /// Primary position fix (GGA).
    Gga,
    /// Recommended minimum (RMC): date, speed, track, validity.
    Rmc,
    /// Geographic position (GLL), fallback fix source.
    Gll,
    /// Satellite status (GSA).
    Gsa,
    /// Course over ground (VTG).
    Vtg,
    /// Vendor pressure altitude (PGRMZ).
    PressureAlt,
    /// Vendor air data: vario, barometric altitude, TAS (PTAS1).
    AirData,
    /// Vendor magnetic compass heading (HCHDG).
    Heading,
    /// Vendor custom airspeed extension (PGNVA).
    Airspeed,
    /// Proximity-traffic status (PFLAU).
    TrafficStatus,
    /// Proximity-traffic contact (PFLAA).
    TrafficContact,
    /// Proximity radio capability/version (PFLAV).
    RadioVersion,
}

const PROPRIETARY_TABLE: &[(&str, SentenceId)] = &[
    ("PGRMZ", SentenceId::PressureAlt),
    ("PTAS1", SentenceId::AirData),
    ("PGNVA", SentenceId::Airspeed),
    ("PFLAU", SentenceId::TrafficStatus),
    ("PFLAA", SentenceId::TrafficContact),
    ("PFLAV", SentenceId::RadioVersion),
];

/// Map a sentence identifier (the first field) to its family.
/// Unknown codes map to `None`; the dispatcher treats that as a no-op.
pub fn classify(code: &str) -> Option<SentenceId> {
    if let Some((_, id)) = PROPRIETARY_TABLE.iter().find(|(c, _)| *c == code) {
        return Some(*id);
    }
    if code.len() == 5 && code.is_ascii() && !code.starts_with('P') {
        return match &code[2..] {
            "GGA" => Some(SentenceId::Gga),
            "RMC" => Some(SentenceId::Rmc),
            "GLL" => Some(SentenceId::Gll),
            "GSA" => Some(SentenceId::Gsa),
            "VTG" => Some(SentenceId::Vtg),
            "HDG" => Some(SentenceId::Heading),
            _ => None,
        };
    }
    None
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

fn nonempty<'a>(fields: &'a Fields, i: usize) -> Option<&'a str> {
    fields.get(i).filter(|s| !s.is_empty())
}

/// Optional numeric field: empty means "unchanged", garbage is an error.
fn num_field(fields: &Fields, i: usize) -> Result<Option<f64>> {
    match nonempty(fields, i) {
        None => Ok(None),
        Some(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| NavError::MalformedSentence("bad numeric field")),
    }
}

fn int_field(fields: &Fields, i: usize) -> Result<Option<u32>> {
    match nonempty(fields, i) {
        None => Ok(None),
        Some(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| NavError::MalformedSentence("bad integer field")),
    }
}

fn hex_field(fields: &Fields, i: usize) -> Result<Option<u8>> {
    match nonempty(fields, i) {
        None => Ok(None),
        Some(s) => u8::from_str_radix(s.trim(), 16)
            .map(Some)
            .map_err(|_| NavError::MalformedSentence("bad hex field")),
    }
}

/// Coordinate pair: `ddmm.mmm` value plus hemisphere letter.
fn coord_field(fields: &Fields, value_i: usize, hemi_i: usize) -> Result<Option<f64>> {
    let (Some(v), Some(h)) = (nonempty(fields, value_i), nonempty(fields, hemi_i)) else {
        return Ok(None);
    };
    let raw: f64 = v
        .parse()
        .map_err(|_| NavError::MalformedSentence("bad coordinate"))?;
    let degrees = (raw / 100.0).trunc();
    let minutes = raw - degrees * 100.0;
    let value = degrees + minutes / 60.0;
    match h {
        "N" | "E" => Ok(Some(value)),
        "S" | "W" => Ok(Some(-value)),
        _ => Err(NavError::MalformedSentence("bad hemisphere")),
    }
}

/// Required fix time field, `hhmmss[.sss]` → seconds within day.
fn time_field(fields: &Fields, i: usize) -> Result<f64> {
    let s = nonempty(fields, i).ok_or(NavError::MalformedSentence("missing fix time"))?;
    let raw: f64 = s
        .parse()
        .map_err(|_| NavError::MalformedSentence("bad fix time"))?;
    let hh = (raw / 10_000.0).trunc();
    let mm = ((raw - hh * 10_000.0) / 100.0).trunc();
    let ss = raw - hh * 10_000.0 - mm * 100.0;
    if !(0.0..24.0).contains(&hh) || !(0.0..60.0).contains(&mm) || !(0.0..61.0).contains(&ss) {
        return Err(NavError::MalformedSentence("fix time out of range"));
    }
    Ok(hh * 3600.0 + mm * 60.0 + ss)
}

/// `ddmmyy` date field.
fn parse_date(s: &str) -> Result<(u16, u8, u8)> {
    if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(NavError::MalformedSentence("bad date"));
    }
    let dd: u8 = s[0..2].parse().unwrap_or(0);
    let mm: u8 = s[2..4].parse().unwrap_or(0);
    let yy: u16 = s[4..6].parse().unwrap_or(0);
    if !(1..=31).contains(&dd) || !(1..=12).contains(&mm) {
        return Err(NavError::MalformedSentence("bad date"));
    }
    let year = if yy < 80 { 2000 + yy } else { 1900 + yy };
    Ok((year, mm, dd))
}

// ---------------------------------------------------------------------------
// Decoders
// ---------------------------------------------------------------------------

impl ParserSession {
    /// GGA: primary fix. Time, position, fix quality, satellites, altitude.
    pub(crate) fn gga(
        &mut self,
        fields: &Fields,
        now: f64,
        state: &mut NavigationState,
    ) -> Result<Outcome> {
        if fields.count() < 11 {
            return Err(NavError::MalformedSentence("short GGA"));
        }
        state.connected = true;
        if let Some(n) = int_field(fields, 7)? {
            state.satellites = n;
        }

        let quality = int_field(fields, 6)?.unwrap_or(0);
        if quality == 0 {
            // explicit no-fix: drop validity immediately, keep the payload out
            state.fix_valid = false;
            self.last_fix_at = None;
            return Ok(Outcome::Updated(SentenceId::Gga));
        }

        let tod = time_field(fields, 1)?;
        if self.advance_time(tod).is_none() {
            return Ok(Outcome::Stale(SentenceId::Gga));
        }
        self.gga_time = Some(tod);
        state.time_of_day = tod;

        if let Some(lat) = coord_field(fields, 2, 3)? {
            state.latitude = lat;
        }
        if let Some(lon) = coord_field(fields, 4, 5)? {
            state.longitude = lon;
        }
        if let (Some(alt), Some(unit)) = (nonempty(fields, 9), nonempty(fields, 10)) {
            state.altitude_m = parse_altitude(alt, unit)?;
        }
        self.note_valid_fix(now, state);
        Ok(Outcome::Updated(SentenceId::Gga))
    }

    /// RMC: validity, position, ground speed, track, date.
    pub(crate) fn rmc(
        &mut self,
        fields: &Fields,
        now: f64,
        state: &mut NavigationState,
    ) -> Result<Outcome> {
        if fields.count() < 10 {
            return Err(NavError::MalformedSentence("short RMC"));
        }
        state.connected = true;

        let status = nonempty(fields, 2).ok_or(NavError::MalformedSentence("missing RMC status"))?;
        if status != "A" {
            if self.gga_time.is_none() {
                state.fix_valid = false;
                self.last_fix_at = None;
            }
            return Ok(Outcome::Updated(SentenceId::Rmc));
        }

        let tod = time_field(fields, 1)?;
        if self.advance_time(tod).is_none() {
            return Ok(Outcome::Stale(SentenceId::Rmc));
        }
        self.rmc_time = Some(tod);
        state.time_of_day = tod;

        if let Some(d) = nonempty(fields, 9) {
            let (year, month, day) = parse_date(d)?;
            state.year = year;
            state.month = month;
            state.day = day;
            state.date_valid = true;
        }
        if let Some(lat) = coord_field(fields, 3, 4)? {
            state.latitude = lat;
        }
        if let Some(lon) = coord_field(fields, 5, 6)? {
            state.longitude = lon;
        }
        if let Some(kt) = num_field(fields, 7)? {
            state.ground_speed_ms = kt * KNOTS_TO_MS;
        }
        if let Some(track) = num_field(fields, 8)? {
            state.track_deg = track;
        }
        // GGA is the fix-validity authority when present
        if self.gga_time.is_none() {
            self.note_valid_fix(now, state);
        }
        Ok(Outcome::Updated(SentenceId::Rmc))
    }

    /// GLL: fallback fix, used only while no GGA/RMC fixes arrive.
    pub(crate) fn gll(
        &mut self,
        fields: &Fields,
        now: f64,
        state: &mut NavigationState,
    ) -> Result<Outcome> {
        if fields.count() < 7 {
            return Err(NavError::MalformedSentence("short GLL"));
        }
        if self.gga_time.is_some() || self.rmc_time.is_some() {
            return Ok(Outcome::Updated(SentenceId::Gll));
        }
        let status = nonempty(fields, 6).ok_or(NavError::MalformedSentence("missing GLL status"))?;
        if status != "A" {
            return Ok(Outcome::Updated(SentenceId::Gll));
        }

        let tod = time_field(fields, 5)?;
        if self.advance_time(tod).is_none() {
            return Ok(Outcome::Stale(SentenceId::Gll));
        }
        self.gll_time = Some(tod);
        state.time_of_day = tod;

        if let Some(lat) = coord_field(fields, 1, 2)? {
            state.latitude = lat;
        }
        if let Some(lon) = coord_field(fields, 3, 4)? {
            state.longitude = lon;
        }
        self.note_valid_fix(now, state);
        Ok(Outcome::Updated(SentenceId::Gll))
    }

    /// GSA: satellite count from the active-PRN list.
    pub(crate) fn gsa(
        &mut self,
        fields: &Fields,
        _now: f64,
        state: &mut NavigationState,
    ) -> Result<Outcome> {
        if fields.count() < 15 {
            return Err(NavError::MalformedSentence("short GSA"));
        }
        state.satellites = (3..=14).filter(|&i| nonempty(fields, i).is_some()).count() as u32;
        Ok(Outcome::Updated(SentenceId::Gsa))
    }

    /// VTG: course over ground. Redundant while RMC is supplying both.
    pub(crate) fn vtg(
        &mut self,
        fields: &Fields,
        _now: f64,
        state: &mut NavigationState,
    ) -> Result<Outcome> {
        if fields.count() < 6 {
            return Err(NavError::MalformedSentence("short VTG"));
        }
        if self.rmc_time.is_some() {
            return Ok(Outcome::Updated(SentenceId::Vtg));
        }
        if let Some(track) = num_field(fields, 1)? {
            state.track_deg = track;
        }
        if let Some(kt) = num_field(fields, 5)? {
            state.ground_speed_ms = kt * KNOTS_TO_MS;
        }
        Ok(Outcome::Updated(SentenceId::Vtg))
    }

    /// PGRMZ: vendor pressure (QNE) altitude. Applied only from the declared
    /// baro source, and only after the heartbeat gate has passed.
    pub(crate) fn pressure_alt(
        &mut self,
        fields: &Fields,
        _now: f64,
        state: &mut NavigationState,
    ) -> Result<Outcome> {
        if fields.count() < 3 {
            return Err(NavError::MalformedSentence("short PGRMZ"));
        }
        if !self.caps.baro_source {
            return Ok(Outcome::Updated(SentenceId::PressureAlt));
        }
        self.rmz_count = self.rmz_count.saturating_add(1);
        if self.rmz_count <= self.caps.baro_gate as u32 {
            return Ok(Outcome::Updated(SentenceId::PressureAlt));
        }
        if let (Some(v), Some(unit)) = (nonempty(fields, 1), nonempty(fields, 2)) {
            state.baro_altitude_m = Some(parse_altitude(v, unit)?);
        }
        Ok(Outcome::Updated(SentenceId::PressureAlt))
    }

    /// PTAS1: vario (0.1 kt units, 200 = zero), barometric altitude
    /// (feet, 2000 = zero), true airspeed (kt).
    pub(crate) fn air_data(
        &mut self,
        fields: &Fields,
        _now: f64,
        state: &mut NavigationState,
    ) -> Result<Outcome> {
        if fields.count() < 5 {
            return Err(NavError::MalformedSentence("short PTAS1"));
        }
        if let Some(cv) = num_field(fields, 1)? {
            state.vertical_speed_ms = Some((cv - 200.0) / 10.0 * KNOTS_TO_MS);
        }
        if let Some(alt) = num_field(fields, 3)? {
            state.baro_altitude_m = Some((alt - 2000.0) * FEET_TO_M);
        }
        if let Some(tas) = num_field(fields, 4)? {
            state.true_airspeed_ms = Some(tas * KNOTS_TO_MS);
        }
        Ok(Outcome::Updated(SentenceId::AirData))
    }

    /// HCHDG: magnetic compass heading.
    pub(crate) fn heading(
        &mut self,
        fields: &Fields,
        _now: f64,
        state: &mut NavigationState,
    ) -> Result<Outcome> {
        if fields.count() < 2 {
            return Err(NavError::MalformedSentence("short HCHDG"));
        }
        if let Some(h) = num_field(fields, 1)? {
            state.heading_deg = Some(h);
        }
        Ok(Outcome::Updated(SentenceId::Heading))
    }

    /// PGNVA: custom airspeed extension, km/h. Always active.
    pub(crate) fn airspeed(
        &mut self,
        fields: &Fields,
        _now: f64,
        state: &mut NavigationState,
    ) -> Result<Outcome> {
        if fields.count() < 2 {
            return Err(NavError::MalformedSentence("short PGNVA"));
        }
        if let Some(kmh) = num_field(fields, 1)? {
            state.true_airspeed_ms = Some(kmh * KMH_TO_MS);
        }
        Ok(Outcome::Updated(SentenceId::Airspeed))
    }

    /// PFLAU: radio status — receive count, TX/GPS health, own alarm level.
    /// Slot aging stays in `poll()` so it runs per cycle, not per sentence.
    pub(crate) fn traffic_status(
        &mut self,
        fields: &Fields,
        now: f64,
        state: &mut NavigationState,
    ) -> Result<Outcome> {
        if fields.count() < 6 {
            return Err(NavError::MalformedSentence("short PFLAU"));
        }
        self.radio_seen_at = Some(now);
        let status = &mut state.traffic_status;
        status.available = true;
        if let Some(rx) = int_field(fields, 1)? {
            status.rx_count = rx;
        }
        if let Some(tx) = int_field(fields, 2)? {
            status.tx_ok = tx != 0;
        }
        if let Some(gps) = int_field(fields, 3)? {
            status.gps_ok = gps != 0;
        }
        if let Some(alarm) = int_field(fields, 5)? {
            status.alarm = AlarmLevel::from_raw(alarm as u8);
        }
        Ok(Outcome::Updated(SentenceId::TrafficStatus))
    }

    /// PFLAA: one proximity contact. Upserts a traffic slot; empty motion
    /// fields (stealth contacts) leave previous values in place.
    pub(crate) fn traffic_contact(
        &mut self,
        fields: &Fields,
        now: f64,
        state: &mut NavigationState,
    ) -> Result<Outcome> {
        if fields.count() < 7 {
            return Err(NavError::MalformedSentence("short PFLAA"));
        }
        let id_text =
            nonempty(fields, 6).ok_or(NavError::MalformedSentence("missing contact id"))?;
        let radio_id =
            radio_id_from_hex(id_text).ok_or(NavError::MalformedSentence("bad contact id"))?;

        let alarm = int_field(fields, 1)?;
        let north = num_field(fields, 2)?;
        let east = num_field(fields, 3)?;
        let vertical = num_field(fields, 4)?;
        let track = num_field(fields, 7)?;
        let turn_rate = num_field(fields, 8)?;
        let speed = num_field(fields, 9)?;
        let climb = num_field(fields, 10)?;
        let aircraft_type = hex_field(fields, 11)?;

        self.radio_seen_at = Some(now);
        state.traffic_status.available = true;

        let plane = self.plane;
        let slot = state.traffic.slot_for(radio_id, now);
        if let Some(a) = alarm {
            slot.alarm = AlarmLevel::from_raw(a as u8);
        }
        if let Some(n) = north {
            slot.north_m = n;
        }
        if let Some(e) = east {
            slot.east_m = e;
        }
        if let Some(v) = vertical {
            slot.vertical_m = v;
        }
        if let Some(t) = track {
            slot.track_deg = Some(t);
        }
        if let Some(r) = turn_rate {
            slot.turn_rate_dps = Some(r);
        }
        if let Some(s) = speed {
            slot.speed_ms = Some(s);
        }
        if let Some(c) = climb {
            slot.climb_ms = Some(c);
        }
        if let Some(t) = aircraft_type {
            slot.aircraft_type = t;
        }
        slot.last_update = now;
        slot.stale = false;
        if let Some(plane) = plane {
            slot.position = Some(plane.project(slot.north_m, slot.east_m));
        }
        Ok(Outcome::Updated(SentenceId::TrafficContact))
    }

    /// PFLAV: radio hardware/software/obstacle-database versions.
    pub(crate) fn radio_version(
        &mut self,
        fields: &Fields,
        now: f64,
        state: &mut NavigationState,
    ) -> Result<Outcome> {
        if fields.count() < 4 {
            return Err(NavError::MalformedSentence("short PFLAV"));
        }
        self.radio_seen_at = Some(now);
        let status = &mut state.traffic_status;
        status.available = true;
        if let Some(hw) = nonempty(fields, 2) {
            status.hardware_version = Some(hw.to_string());
        }
        if let Some(sw) = nonempty(fields, 3) {
            status.software_version = Some(sw.to_string());
        }
        if let Some(obst) = nonempty(fields, 4) {
            status.obstacle_version = Some(obst.to_string());
        }
        Ok(Outcome::Updated(SentenceId::RadioVersion))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::with_checksum;

    fn parse(session: &mut ParserSession, state: &mut NavigationState, payload: &str) -> Outcome {
        session
            .parse_line(&with_checksum(payload), 0.0, state)
            .expect("valid sentence")
    }

    fn fresh() -> (ParserSession, NavigationState) {
        (ParserSession::new("gps0"), NavigationState::new())
    }

    // -- classification --

    #[test]
    fn test_classify_any_talker() {
        assert_eq!(classify("GPGGA"), Some(SentenceId::Gga));
        assert_eq!(classify("GNGGA"), Some(SentenceId::Gga));
        assert_eq!(classify("GPRMC"), Some(SentenceId::Rmc));
        assert_eq!(classify("HCHDG"), Some(SentenceId::Heading));
    }

    #[test]
    fn test_classify_proprietary() {
        assert_eq!(classify("PFLAA"), Some(SentenceId::TrafficContact));
        assert_eq!(classify("PFLAU"), Some(SentenceId::TrafficStatus));
        assert_eq!(classify("PFLAV"), Some(SentenceId::RadioVersion));
        assert_eq!(classify("PGRMZ"), Some(SentenceId::PressureAlt));
        assert_eq!(classify("PTAS1"), Some(SentenceId::AirData));
        assert_eq!(classify("PGNVA"), Some(SentenceId::Airspeed));
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(classify("GPXTE"), None);
        assert_eq!(classify("PSRF103"), None);
        assert_eq!(classify(""), None);
        assert_eq!(classify("GGA"), None);
    }

    // -- GGA --

    #[test]
    fn test_gga_full_decode() {
        let (mut session, mut state) = fresh();
        let out = parse(
            &mut session,
            &mut state,
            "GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,",
        );
        assert_eq!(out, Outcome::Updated(SentenceId::Gga));
        assert!(state.connected);
        assert!(state.fix_valid);
        assert!((state.latitude - 48.1173).abs() < 1e-4);
        assert!((state.longitude - 11.516667).abs() < 1e-4);
        assert_eq!(state.altitude_m, 545.4);
        assert_eq!(state.satellites, 8);
        assert!((state.time_of_day - 45319.0).abs() < 1e-9);
    }

    #[test]
    fn test_gga_southern_western_hemisphere() {
        let (mut session, mut state) = fresh();
        parse(
            &mut session,
            &mut state,
            "GPGGA,123519,3356.500,S,15112.000,W,1,08,0.9,12.0,M,,,,",
        );
        assert!(state.latitude < 0.0);
        assert!(state.longitude < 0.0);
    }

    #[test]
    fn test_gga_no_fix_clears_validity() {
        let (mut session, mut state) = fresh();
        parse(
            &mut session,
            &mut state,
            "GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,",
        );
        let before = state.latitude;

        parse(&mut session, &mut state, "GPGGA,123520,,,,,0,03,,,,,,,");
        assert!(state.connected);
        assert!(!state.fix_valid);
        assert_eq!(state.latitude, before, "no-fix sentence leaves position");
        assert_eq!(state.satellites, 3);
    }

    #[test]
    fn test_gga_empty_fields_leave_state() {
        let (mut session, mut state) = fresh();
        parse(
            &mut session,
            &mut state,
            "GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,",
        );
        parse(
            &mut session,
            &mut state,
            "GPGGA,123520,,,,,1,,0.9,,,46.9,M,,",
        );
        assert!((state.latitude - 48.1173).abs() < 1e-4);
        assert_eq!(state.altitude_m, 545.4);
        assert_eq!(state.satellites, 8);
    }

    #[test]
    fn test_gga_feet_altitude() {
        let (mut session, mut state) = fresh();
        parse(
            &mut session,
            &mut state,
            "GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,1000,F,,,,",
        );
        assert!((state.altitude_m - 304.8).abs() < 0.01);
    }

    #[test]
    fn test_gga_bad_altitude_unit_rejected() {
        let (mut session, mut state) = fresh();
        let line = with_checksum("GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,X,46.9,M,,");
        assert!(matches!(
            session.parse_line(&line, 0.0, &mut state),
            Err(NavError::UnsupportedUnitCode('X'))
        ));
    }

    // -- RMC --

    #[test]
    fn test_rmc_decode() {
        let (mut session, mut state) = fresh();
        let out = parse(
            &mut session,
            &mut state,
            "GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W",
        );
        assert_eq!(out, Outcome::Updated(SentenceId::Rmc));
        assert!(state.connected);
        assert!(state.date_valid);
        assert_eq!((state.year, state.month, state.day), (1994, 3, 23));
        assert!((state.ground_speed_ms - 22.4 * KNOTS_TO_MS).abs() < 1e-9);
        assert_eq!(state.track_deg, 84.4);
        assert!(state.fix_valid);
    }

    #[test]
    fn test_rmc_century_split() {
        let (mut session, mut state) = fresh();
        parse(
            &mut session,
            &mut state,
            "GPRMC,123519,A,4807.038,N,01131.000,E,0.0,0.0,010126,,",
        );
        assert_eq!(state.year, 2026);
    }

    #[test]
    fn test_rmc_void_skips_payload() {
        let (mut session, mut state) = fresh();
        parse(
            &mut session,
            &mut state,
            "GPRMC,123519,V,4807.038,N,01131.000,E,022.4,084.4,230394,,",
        );
        assert!(state.connected);
        assert!(!state.date_valid);
        assert_eq!(state.latitude, 0.0);
        assert!(!state.fix_valid);
    }

    // -- GLL --

    #[test]
    fn test_gll_fallback_applies_when_alone() {
        let (mut session, mut state) = fresh();
        let out = parse(
            &mut session,
            &mut state,
            "GPGLL,4916.45,N,12311.12,W,225444,A,",
        );
        assert_eq!(out, Outcome::Updated(SentenceId::Gll));
        assert!((state.latitude - 49.274167).abs() < 1e-4);
        assert!(state.fix_valid);
    }

    #[test]
    fn test_gll_skipped_when_primary_active() {
        let (mut session, mut state) = fresh();
        parse(
            &mut session,
            &mut state,
            "GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,",
        );
        parse(
            &mut session,
            &mut state,
            "GPGLL,4916.45,N,12311.12,W,123520,A,",
        );
        assert!((state.latitude - 48.1173).abs() < 1e-4, "GLL must not win");
    }

    // -- GSA / VTG --

    #[test]
    fn test_gsa_counts_active_satellites() {
        let (mut session, mut state) = fresh();
        parse(
            &mut session,
            &mut state,
            "GPGSA,A,3,04,05,,09,12,,,24,,,,,2.5,1.3,2.1",
        );
        assert_eq!(state.satellites, 5);
    }

    #[test]
    fn test_vtg_applies_without_rmc() {
        let (mut session, mut state) = fresh();
        parse(
            &mut session,
            &mut state,
            "GPVTG,054.7,T,034.4,M,005.5,N,010.2,K",
        );
        assert_eq!(state.track_deg, 54.7);
        assert!((state.ground_speed_ms - 5.5 * KNOTS_TO_MS).abs() < 1e-9);
    }

    #[test]
    fn test_vtg_skipped_while_rmc_available() {
        let (mut session, mut state) = fresh();
        parse(
            &mut session,
            &mut state,
            "GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,,",
        );
        parse(
            &mut session,
            &mut state,
            "GPVTG,200.0,T,,M,099.0,N,,K",
        );
        assert_eq!(state.track_deg, 84.4);
    }

    // -- vendor sentences --

    #[test]
    fn test_pressure_alt_heartbeat_gate() {
        let (mut session, mut state) = fresh();
        for _ in 0..3 {
            parse(&mut session, &mut state, "PGRMZ,2282,f,3");
            assert!(state.baro_altitude_m.is_none(), "gated");
        }
        parse(&mut session, &mut state, "PGRMZ,2282,f,3");
        let alt = state.baro_altitude_m.expect("gate passed");
        assert!((alt - 2282.0 * FEET_TO_M).abs() < 0.01);
    }

    #[test]
    fn test_pressure_alt_ignored_without_capability() {
        let caps = crate::session::SessionCaps {
            baro_source: false,
            ..Default::default()
        };
        let mut session = ParserSession::with_caps("gps0", caps);
        let mut state = NavigationState::new();
        for _ in 0..10 {
            parse(&mut session, &mut state, "PGRMZ,2282,f,3");
        }
        assert!(state.baro_altitude_m.is_none());
    }

    #[test]
    fn test_air_data_decode() {
        let (mut session, mut state) = fresh();
        parse(&mut session, &mut state, "PTAS1,220,200,2500,115");
        let vario = state.vertical_speed_ms.unwrap();
        assert!((vario - 2.0 * KNOTS_TO_MS).abs() < 1e-9);
        let baro = state.baro_altitude_m.unwrap();
        assert!((baro - 500.0 * FEET_TO_M).abs() < 1e-9);
        let tas = state.true_airspeed_ms.unwrap();
        assert!((tas - 115.0 * KNOTS_TO_MS).abs() < 1e-9);
    }

    #[test]
    fn test_air_data_sink() {
        let (mut session, mut state) = fresh();
        parse(&mut session, &mut state, "PTAS1,150,200,1800,90");
        assert!(state.vertical_speed_ms.unwrap() < 0.0);
        assert!(state.baro_altitude_m.unwrap() < 0.0);
    }

    #[test]
    fn test_heading_decode() {
        let (mut session, mut state) = fresh();
        parse(&mut session, &mut state, "HCHDG,101.1,,,7.1,W");
        assert_eq!(state.heading_deg, Some(101.1));
    }

    #[test]
    fn test_airspeed_extension() {
        let (mut session, mut state) = fresh();
        parse(&mut session, &mut state, "PGNVA,102.6");
        let tas = state.true_airspeed_ms.unwrap();
        assert!((tas - 102.6 * KMH_TO_MS).abs() < 1e-9);
    }

    // -- proximity traffic --

    #[test]
    fn test_traffic_status_decode() {
        let (mut session, mut state) = fresh();
        parse(&mut session, &mut state, "PFLAU,3,1,2,1,2,-30,2,-32,755,DD8F12");
        let status = &state.traffic_status;
        assert!(status.available);
        assert_eq!(status.rx_count, 3);
        assert!(status.tx_ok);
        assert!(status.gps_ok);
        assert_eq!(status.alarm, AlarmLevel::Important);
    }

    #[test]
    fn test_traffic_contact_creates_slot() {
        let (mut session, mut state) = fresh();
        parse(
            &mut session,
            &mut state,
            "PFLAA,1,-1234,1234,220,2,DD8F12,180,,30,-1.4,1",
        );
        assert_eq!(state.traffic.len(), 1);
        let slot = state.traffic.get(0xDD8F12).unwrap();
        assert_eq!(slot.alarm, AlarmLevel::Low);
        assert_eq!(slot.north_m, -1234.0);
        assert_eq!(slot.east_m, 1234.0);
        assert_eq!(slot.vertical_m, 220.0);
        assert_eq!(slot.track_deg, Some(180.0));
        assert_eq!(slot.turn_rate_dps, None);
        assert_eq!(slot.speed_ms, Some(30.0));
        assert_eq!(slot.climb_ms, Some(-1.4));
        assert_eq!(slot.aircraft_type, 1);
    }

    #[test]
    fn test_traffic_contact_sparse_update() {
        let (mut session, mut state) = fresh();
        parse(
            &mut session,
            &mut state,
            "PFLAA,0,-1234,1234,220,2,DD8F12,180,2.5,30,-1.4,1",
        );
        // stealth-style repeat: motion fields withheld
        parse(&mut session, &mut state, "PFLAA,0,-1200,1200,210,2,DD8F12,,,,,");
        let slot = state.traffic.get(0xDD8F12).unwrap();
        assert_eq!(slot.north_m, -1200.0);
        assert_eq!(slot.track_deg, Some(180.0), "unchanged");
        assert_eq!(slot.speed_ms, Some(30.0), "unchanged");
        assert_eq!(slot.climb_ms, Some(-1.4), "unchanged");
    }

    #[test]
    fn test_traffic_contact_bad_id_rejected() {
        let (mut session, mut state) = fresh();
        let line = with_checksum("PFLAA,0,10,10,0,2,GGGGGG,,,,,");
        assert!(session.parse_line(&line, 0.0, &mut state).is_err());
        assert!(state.traffic.is_empty());
    }

    #[test]
    fn test_radio_version_decode() {
        let (mut session, mut state) = fresh();
        parse(&mut session, &mut state, "PFLAV,A,2.00,5.00,alps20110221_");
        let status = &state.traffic_status;
        assert!(status.available);
        assert_eq!(status.hardware_version.as_deref(), Some("2.00"));
        assert_eq!(status.software_version.as_deref(), Some("5.00"));
        assert_eq!(status.obstacle_version.as_deref(), Some("alps20110221_"));
    }

    // -- helpers --

    #[test]
    fn test_time_field_rejects_out_of_range() {
        let fields = crate::tokenizer::Fields::extract("X,250000");
        assert!(time_field(&fields, 1).is_err());
        let fields = crate::tokenizer::Fields::extract("X,126100");
        assert!(time_field(&fields, 1).is_err());
    }

    #[test]
    fn test_time_field_fractional_seconds() {
        let fields = crate::tokenizer::Fields::extract("X,123519.50");
        let tod = time_field(&fields, 1).unwrap();
        assert!((tod - 45319.5).abs() < 1e-9);
    }

    #[test]
    fn test_parse_date_validation() {
        assert!(parse_date("230394").is_ok());
        assert!(parse_date("001294").is_err());
        assert!(parse_date("311394").is_err());
        assert!(parse_date("23039").is_err());
        assert!(parse_date("23a394").is_err());
    }
}
