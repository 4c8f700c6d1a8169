//! Tokenize raw receiver lines into validated, bounded field sequences.
//!
//! Responsibilities:
//! - Verify the `$` start marker and the `*HH` XOR-8 checksum suffix
//! - Split the payload into a fixed-capacity field buffer, never writing
//!   past capacity
//! - Fetch a single field by ordinal without building the full array
//! - Append a checksum when composing outgoing sentences

use crate::types::{NavError, Result};

/// Maximum accepted payload length in bytes. Standard sentences stay under
/// 82 bytes; traffic radios exceed that, so the cap is generous.
pub const MAX_SENTENCE: usize = 160;

/// Maximum number of comma-delimited fields captured per sentence.
pub const MAX_FIELDS: usize = 40;

// ---------------------------------------------------------------------------
// Checksum
// ---------------------------------------------------------------------------

/// 8-bit XOR over every payload byte (everything between `$` and `*`).
pub fn checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0, |acc, b| acc ^ b)
}

/// Wrap a payload as a full sentence: `$<payload>*HH`.
pub fn with_checksum(payload: &str) -> String {
    format!("${payload}*{:02X}", checksum(payload.as_bytes()))
}

/// Validate framing and checksum, returning the payload between `$` and `*`.
///
/// Trailing CR/LF is stripped first. The checksum suffix is required; the
/// two hex digits are matched case-insensitively.
pub fn validate(line: &str) -> Result<&str> {
    let line = line.trim_end_matches(['\r', '\n']);
    let body = line
        .strip_prefix('$')
        .ok_or(NavError::MalformedSentence("missing start marker"))?;
    let star = body
        .rfind('*')
        .ok_or(NavError::MalformedSentence("missing checksum delimiter"))?;
    let (payload, suffix) = body.split_at(star);
    let digits = &suffix[1..];
    if digits.len() != 2 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(NavError::MalformedSentence("bad checksum digits"));
    }
    if payload.is_empty() {
        return Err(NavError::MalformedSentence("empty sentence"));
    }
    let want = u8::from_str_radix(digits, 16)
        .map_err(|_| NavError::MalformedSentence("bad checksum digits"))?;
    if checksum(payload.as_bytes()) != want {
        return Err(NavError::ChecksumMismatch);
    }
    Ok(payload)
}

/// Fetch one field by ordinal directly from a raw line, without building
/// the field array. The sentence identifier is ordinal 0. Anything at or
/// after the checksum delimiter is not a field.
pub fn field_at(line: &str, ordinal: usize) -> Option<&str> {
    let line = line.trim_end_matches(['\r', '\n']);
    let body = line.strip_prefix('$').unwrap_or(line);
    let body = match body.find('*') {
        Some(i) => &body[..i],
        None => body,
    };
    body.split(',').nth(ordinal)
}

// ---------------------------------------------------------------------------
// Bounded field extraction
// ---------------------------------------------------------------------------

/// A tokenized sentence payload: a fixed-capacity byte buffer plus field
/// spans. Field 0 is the sentence identifier.
///
/// Extraction never writes past capacity. When the payload carries more
/// fields (or bytes) than fit, `count()` reports the fields actually
/// captured, capped at capacity, and `is_truncated()` is set. A field cut
/// mid-way by the length cap is dropped rather than exposed half-written.
pub struct Fields {
    buf: [u8; MAX_SENTENCE],
    spans: [(u16, u16); MAX_FIELDS],
    count: usize,
    truncated: bool,
}

impl Fields {
    pub fn extract(payload: &str) -> Fields {
        let bytes = payload.as_bytes();
        let copied = bytes.len().min(MAX_SENTENCE);
        let mut buf = [0u8; MAX_SENTENCE];
        buf[..copied].copy_from_slice(&bytes[..copied]);
        let cut = copied < bytes.len();

        let mut spans = [(0u16, 0u16); MAX_FIELDS];
        let mut count = 0;
        let mut truncated = cut;
        let mut start = 0usize;
        let mut i = 0usize;
        loop {
            if i == copied || buf[i] == b',' {
                let at_end = i == copied;
                if !(at_end && cut) {
                    if count < MAX_FIELDS {
                        spans[count] = (start as u16, i as u16);
                        count += 1;
                    } else {
                        truncated = true;
                        break;
                    }
                }
                if at_end {
                    break;
                }
                start = i + 1;
            }
            i += 1;
        }

        Fields {
            buf,
            spans,
            count,
            truncated,
        }
    }

    /// Field by index; `None` past the captured count.
    pub fn get(&self, i: usize) -> Option<&str> {
        if i >= self.count {
            return None;
        }
        let (a, b) = self.spans[i];
        std::str::from_utf8(&self.buf[a as usize..b as usize]).ok()
    }

    /// Number of fields actually captured, capped at capacity.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

/// Validate a raw line and extract its fields.
///
/// A truncated extraction is reported distinctly as `FieldOverflow`; the
/// malformed/checksum failures come from [`validate`].
pub fn tokenize(line: &str) -> Result<Fields> {
    let payload = validate(line)?;
    let fields = Fields::extract(payload);
    if fields.is_truncated() {
        return Err(NavError::FieldOverflow {
            captured: fields.count(),
        });
    }
    Ok(fields)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const GGA: &str = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47";

    #[test]
    fn test_checksum_documented_example() {
        assert!(validate(GGA).is_ok());
        let payload = &GGA[1..GGA.len() - 3];
        assert_eq!(with_checksum(payload), GGA);
    }

    #[test]
    fn test_lowercase_checksum_accepted() {
        let line = with_checksum("GPVTG,054.7,T,034.4,M,005.5,N,010.2,K");
        let (body, digits) = line.split_at(line.len() - 2);
        let lowered = format!("{body}{}", digits.to_lowercase());
        assert!(validate(&lowered).is_ok());
    }

    #[test]
    fn test_single_bit_flip_rejected() {
        let mut bytes = GGA.as_bytes().to_vec();
        let star = GGA.rfind('*').unwrap();
        for i in 1..star {
            for bit in 0..8 {
                bytes[i] ^= 1 << bit;
                let mutated = String::from_utf8_lossy(&bytes).into_owned();
                assert!(
                    validate(&mutated).is_err(),
                    "bit {bit} of byte {i} should break validation"
                );
                bytes[i] ^= 1 << bit;
            }
        }
    }

    #[test]
    fn test_missing_start_marker() {
        assert!(matches!(
            validate("GPGGA,123519*7A"),
            Err(NavError::MalformedSentence(_))
        ));
    }

    #[test]
    fn test_missing_checksum() {
        assert!(matches!(
            validate("$GPGGA,123519"),
            Err(NavError::MalformedSentence(_))
        ));
    }

    #[test]
    fn test_bad_checksum_digits() {
        assert!(matches!(
            validate("$GPGGA,123519*Z1"),
            Err(NavError::MalformedSentence(_))
        ));
        assert!(matches!(
            validate("$GPGGA,123519*4"),
            Err(NavError::MalformedSentence(_))
        ));
    }

    #[test]
    fn test_wrong_checksum() {
        assert!(matches!(
            validate("$GPGGA,123519*00"),
            Err(NavError::ChecksumMismatch)
        ));
    }

    #[test]
    fn test_empty_payload() {
        assert!(matches!(
            validate("$*00"),
            Err(NavError::MalformedSentence(_))
        ));
    }

    #[test]
    fn test_crlf_stripped() {
        let line = format!("{GGA}\r\n");
        assert!(validate(&line).is_ok());
    }

    #[test]
    fn test_field_extraction_exact_sequence() {
        let fields = tokenize(GGA).unwrap();
        let expected = [
            "GPGGA", "123519", "4807.038", "N", "01131.000", "E", "1", "08", "0.9", "545.4",
            "M", "46.9", "M", "", "",
        ];
        assert_eq!(fields.count(), expected.len());
        for (i, want) in expected.iter().enumerate() {
            assert_eq!(fields.get(i), Some(*want), "field {i}");
        }
        assert_eq!(fields.get(expected.len()), None);
    }

    #[test]
    fn test_field_at_ordinals() {
        assert_eq!(field_at(GGA, 0), Some("GPGGA"));
        assert_eq!(field_at(GGA, 1), Some("123519"));
        assert_eq!(field_at(GGA, 10), Some("M"));
        assert_eq!(field_at(GGA, 99), None);
    }

    #[test]
    fn test_field_at_without_checksum() {
        assert_eq!(field_at("$GPGGA,123519,4807.038", 2), Some("4807.038"));
    }

    #[test]
    fn test_empty_fields_preserved() {
        let fields = Fields::extract("A,,B");
        assert_eq!(fields.count(), 3);
        assert_eq!(fields.get(1), Some(""));
        assert_eq!(fields.get(2), Some("B"));
    }

    #[test]
    fn test_field_count_overflow() {
        let payload: String = std::iter::repeat("x")
            .take(MAX_FIELDS + 5)
            .collect::<Vec<_>>()
            .join(",");
        let fields = Fields::extract(&payload);
        assert!(fields.is_truncated());
        assert_eq!(fields.count(), MAX_FIELDS);

        let line = with_checksum(&payload);
        match tokenize(&line) {
            Err(NavError::FieldOverflow { captured }) => assert_eq!(captured, MAX_FIELDS),
            Err(e) => panic!("expected FieldOverflow, got {e:?}"),
            Ok(_) => panic!("expected FieldOverflow, got Ok"),
        }
    }

    #[test]
    fn test_length_overflow_drops_cut_field() {
        // One long tail field that crosses the byte cap: it must be dropped,
        // earlier fields must survive intact.
        let tail = "Y".repeat(MAX_SENTENCE);
        let payload = format!("HDR,AAA,{tail}");
        let fields = Fields::extract(&payload);
        assert!(fields.is_truncated());
        assert_eq!(fields.count(), 2);
        assert_eq!(fields.get(0), Some("HDR"));
        assert_eq!(fields.get(1), Some("AAA"));
    }
}
