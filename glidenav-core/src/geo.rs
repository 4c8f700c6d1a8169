//! Local tangent-plane projection for short-range traffic offsets.
//!
//! Proximity contacts report north/east offsets in metres from own ship.
//! Converting them to absolute coordinates uses a flat-Earth approximation
//! around a captured reference position; the per-degree scale factors are
//! recomputed by the session once own ship drifts far enough that the
//! linearization would degrade.

use serde::Serialize;

/// Mean Earth radius, metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Metres per degree of latitude on the spherical model.
const M_PER_DEG: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

/// Own-ship drift from the captured reference that forces a new plane.
pub const PLANE_DRIFT_M: f64 = 2_000.0;

/// A geographic position in signed degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Position {
            latitude,
            longitude,
        }
    }
}

/// Tangent plane anchored at a reference position.
///
/// `project` and `unproject` are pure functions of the captured reference
/// and the offsets; they are exact inverses of each other.
#[derive(Debug, Clone, Copy)]
pub struct TangentPlane {
    reference: Position,
    lat_per_meter: f64,
    lon_per_meter: f64,
}

impl TangentPlane {
    pub fn new(reference: Position) -> Self {
        // cos() collapses at the poles; clamp so the scale stays finite
        let cos_lat = reference.latitude.to_radians().cos().max(1e-6);
        TangentPlane {
            reference,
            lat_per_meter: 1.0 / M_PER_DEG,
            lon_per_meter: 1.0 / (M_PER_DEG * cos_lat),
        }
    }

    pub fn reference(&self) -> Position {
        self.reference
    }

    /// Convert a north/east offset (metres) into absolute coordinates.
    pub fn project(&self, north_m: f64, east_m: f64) -> Position {
        Position {
            latitude: self.reference.latitude + north_m * self.lat_per_meter,
            longitude: self.reference.longitude + east_m * self.lon_per_meter,
        }
    }

    /// Inverse of [`project`](Self::project): recover the north/east offset.
    pub fn unproject(&self, pos: Position) -> (f64, f64) {
        (
            (pos.latitude - self.reference.latitude) / self.lat_per_meter,
            (pos.longitude - self.reference.longitude) / self.lon_per_meter,
        )
    }

    /// Flat-plane distance of a position from the captured reference.
    pub fn drift_m(&self, pos: Position) -> f64 {
        let (n, e) = self.unproject(pos);
        (n * n + e * e).sqrt()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
