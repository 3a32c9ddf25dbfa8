//! Unit-separator wire codec.
//!
//! A frame is an identifier followed by zero or more payload fields, all
//! joined by a single [`SEPARATOR`] byte (ASCII 0x1F). A frame with no
//! separator is an identifier with an empty payload. Payload fields that
//! themselves contain the separator do not survive a round trip.

use crate::id::Id;

/// Field separator byte (ASCII unit separator).
pub const SEPARATOR: u8 = 0x1F;

/// Encode an identifier and payload into one frame.
///
/// An empty payload yields exactly the bytes of `id`, with no trailing
/// separator.
pub fn encode<S: AsRef<str>>(id: &str, data: &[S]) -> Vec<u8> {
    let len = id.len() + data.iter().map(|d| d.as_ref().len() + 1).sum::<usize>();
    let mut frame = Vec::with_capacity(len);
    frame.extend_from_slice(id.as_bytes());
    for field in data {
        frame.push(SEPARATOR);
        frame.extend_from_slice(field.as_ref().as_bytes());
    }
    frame
}

/// Decode a frame into its identifier and payload fields.
///
/// Never fails: an empty frame decodes to an empty identifier with no payload,
/// and invalid UTF-8 is replaced lossily.
pub fn decode(frame: &[u8]) -> (Id, Vec<String>) {
    let mut fields = frame
        .split(|b| *b == SEPARATOR)
        .map(|f| String::from_utf8_lossy(f).into_owned());
    let id = fields.next().map(Id::from).unwrap_or_default();
    (id, fields.collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_without_data_is_bare_id() {
        let empty: [&str; 0] = [];
        assert_eq!(encode("agent-1", &empty), b"agent-1".to_vec());
    }

    #[test]
    fn test_encode_joins_with_separator() {
        assert_eq!(encode("A", &["x", "y"]), b"A\x1Fx\x1Fy".to_vec());
    }

    #[test]
    fn test_decode_without_separator() {
        let (id, data) = decode(b"@whoami");
        assert_eq!(id, "@whoami");
        assert!(data.is_empty());
    }

    #[test]
    fn test_decode_empty_frame() {
        let (id, data) = decode(b"");
        assert!(id.is_empty());
        assert!(data.is_empty());
    }

    #[test]
    fn test_empty_fields_are_preserved() {
        let (id, data) = decode(b"to\x1F\x1Fz\x1F");
        assert_eq!(id, "to");
        assert_eq!(data, vec!["", "z", ""]);
    }

    #[test]
    fn test_roundtrip_keeps_order() {
        let data = vec!["first".to_string(), String::new(), "third ünïcode".to_string()];
        let (id, decoded) = decode(&encode("42", &data));
        assert_eq!(id, "42");
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_separator_in_field_splits() {
        let (_, decoded) = decode(&encode("a", &["b\u{1F}c"]));
        assert_eq!(decoded, vec!["b", "c"]);
    }
}
