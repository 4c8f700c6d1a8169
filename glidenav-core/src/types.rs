//! Shared types, error enum, and radio-identifier helpers for glidenav-core.

use serde::Serialize;
use thiserror::Error;

/// All errors produced by glidenav-core.
#[derive(Debug, Error)]
pub enum NavError {
    #[error("checksum mismatch")]
    ChecksumMismatch,
    #[error("malformed sentence: {0}")]
    MalformedSentence(&'static str),
    #[error("field overflow: {captured} fields captured")]
    FieldOverflow { captured: usize },
    #[error("unsupported altitude unit code: {0:?}")]
    UnsupportedUnitCode(char),
    #[error("config error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NavError>;

// ---------------------------------------------------------------------------
// Radio identifier helpers
// ---------------------------------------------------------------------------

/// 24-bit traffic radio identifier. Stored as `u32` to avoid per-sentence
/// String allocation; stable across updates for the same contact.
pub type RadioId = u32;

/// Parse a 1-6 char hex string into a radio identifier.
pub fn radio_id_from_hex(hex: &str) -> Option<RadioId> {
    if hex.is_empty() || hex.len() > 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

/// Format a radio identifier as a 6-char uppercase hex string.
pub fn radio_id_to_string(id: RadioId) -> String {
    format!("{id:06X}")
}

// ---------------------------------------------------------------------------
// Alarm levels
// ---------------------------------------------------------------------------

/// Collision alarm level reported by the traffic radio.
///
/// Level 3 corresponds to the shortest time-to-impact bracket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum AlarmLevel {
    #[default]
    None,
    Low,
    Important,
    Urgent,
}

impl AlarmLevel {
    /// Map the wire value. Values above 3 saturate at `Urgent`.
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => AlarmLevel::None,
            1 => AlarmLevel::Low,
            2 => AlarmLevel::Important,
            _ => AlarmLevel::Urgent,
        }
    }
}

impl std::fmt::Display for AlarmLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlarmLevel::None => write!(f, "none"),
            AlarmLevel::Low => write!(f, "low"),
            AlarmLevel::Important => write!(f, "important"),
            AlarmLevel::Urgent => write!(f, "urgent"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radio_id_roundtrip() {
        let id = radio_id_from_hex("DD8F12").unwrap();
        assert_eq!(id, 0xDD8F12);
        assert_eq!(radio_id_to_string(id), "DD8F12");
    }

    #[test]
    fn test_radio_id_short_hex() {
        assert_eq!(radio_id_from_hex("1A"), Some(0x1A));
        assert_eq!(radio_id_to_string(0x1A), "00001A");
    }

    #[test]
    fn test_radio_id_invalid() {
        assert_eq!(radio_id_from_hex(""), None);
        assert_eq!(radio_id_from_hex("XYZ"), None);
        assert_eq!(radio_id_from_hex("1234567"), None);
    }

    #[test]
    fn test_alarm_level_from_raw() {
        assert_eq!(AlarmLevel::from_raw(0), AlarmLevel::None);
        assert_eq!(AlarmLevel::from_raw(1), AlarmLevel::Low);
        assert_eq!(AlarmLevel::from_raw(2), AlarmLevel::Important);
        assert_eq!(AlarmLevel::from_raw(3), AlarmLevel::Urgent);
        assert_eq!(AlarmLevel::from_raw(9), AlarmLevel::Urgent);
    }

    #[test]
    fn test_alarm_level_ordering() {
        assert!(AlarmLevel::Urgent > AlarmLevel::Important);
        assert!(AlarmLevel::Low > AlarmLevel::None);
    }
}
