//! Unit conversion constants and the altitude field decoder.
//!
//! Everything internal is SI: metres, metres per second, degrees.

use crate::types::{NavError, Result};

pub const FEET_TO_M: f64 = 0.3048;
pub const KNOTS_TO_MS: f64 = 1852.0 / 3600.0;
pub const KMH_TO_MS: f64 = 1.0 / 3.6;

/// Decode an altitude field plus its one-character unit code into metres.
///
/// `M`/`m` is metres, `F`/`f` is feet. An unrecognized unit code is an
/// error, never a silent default.
pub fn parse_altitude(value: &str, unit: &str) -> Result<f64> {
    let v: f64 = value
        .trim()
        .parse()
        .map_err(|_| NavError::MalformedSentence("bad altitude value"))?;
    let code = unit
        .chars()
        .next()
        .ok_or(NavError::MalformedSentence("missing altitude unit"))?;
    match code {
        'M' | 'm' => Ok(v),
        'F' | 'f' => Ok(v * FEET_TO_M),
        other => Err(NavError::UnsupportedUnitCode(other)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_altitude_meters() {
        assert_eq!(parse_altitude("1000", "M").unwrap(), 1000.0);
        assert_eq!(parse_altitude("545.4", "m").unwrap(), 545.4);
    }

    #[test]
    fn test_parse_altitude_feet() {
        let m = parse_altitude("1000", "F").unwrap();
        assert!((m - 304.8).abs() < 0.01, "got {m}");
        assert!((parse_altitude("1000", "f").unwrap() - 304.8).abs() < 0.01);
    }

    #[test]
    fn test_parse_altitude_negative() {
        assert_eq!(parse_altitude("-12.5", "M").unwrap(), -12.5);
    }

    #[test]
    fn test_parse_altitude_unknown_unit() {
        assert!(matches!(
            parse_altitude("1000", "X"),
            Err(NavError::UnsupportedUnitCode('X'))
        ));
    }

    #[test]
    fn test_parse_altitude_missing_unit() {
        assert!(parse_altitude("1000", "").is_err());
    }

    #[test]
    fn test_parse_altitude_garbage_value() {
        assert!(parse_altitude("12..0", "M").is_err());
        assert!(parse_altitude("", "M").is_err());
    }

    #[test]
    fn test_conversion_constants() {
        assert!((KNOTS_TO_MS - 0.514444).abs() < 1e-6);
        assert!((10.0 * KMH_TO_MS - 2.777778).abs() < 1e-6);
    }
}
