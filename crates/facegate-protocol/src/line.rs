//! Classification of raw inbound lines.

use crate::packet::StatusPacket;
use facegate_core::constants::{MAX_LINE_LENGTH, PACKET_START};
use facegate_core::{Error, Result};

/// A decoded, non-blank inbound line.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundLine {
    /// Structured status record.
    Status(StatusPacket),

    /// Free-form text printed by the firmware. Logged, never interpreted.
    Diagnostic(String),
}

/// Decode and classify one raw line read from the controller.
///
/// Bytes that are not valid UTF-8 are dropped, surrounding whitespace
/// (including the line terminator) is trimmed. Returns `Ok(None)` for blank
/// lines.
///
/// # Errors
/// Returns `Error::MalformedPacket` if the line exceeds `MAX_LINE_LENGTH` or
/// looks like a packet but does not parse.
///
/// # Examples
///
/// ```
/// use facegate_protocol::{classify_line, InboundLine};
///
/// let line = classify_line(b"[esp] wifi connected\r\n").unwrap();
/// assert_eq!(line, Some(InboundLine::Diagnostic("[esp] wifi connected".into())));
///
/// assert!(matches!(
///     classify_line(br#"{"motion":0}"#).unwrap(),
///     Some(InboundLine::Status(_))
/// ));
///
/// assert_eq!(classify_line(b"\n").unwrap(), None);
/// ```
pub fn classify_line(raw: &[u8]) -> Result<Option<InboundLine>> {
    if raw.len() > MAX_LINE_LENGTH {
        return Err(Error::MalformedPacket(format!(
            "line of {} bytes exceeds limit of {MAX_LINE_LENGTH}",
            raw.len()
        )));
    }

    let decoded = String::from_utf8_lossy(raw);
    let text: String = decoded
        .trim()
        .chars()
        .filter(|c| *c != char::REPLACEMENT_CHARACTER)
        .collect();

    if text.is_empty() {
        return Ok(None);
    }

    if text.starts_with(PACKET_START) {
        return StatusPacket::parse(&text).map(|p| Some(InboundLine::Status(p)));
    }

    Ok(Some(InboundLine::Diagnostic(text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use facegate_core::PowerState;

    #[test]
    fn test_status_line() {
        let line = classify_line(b"{\"fan\":\"off\"}\n").unwrap();
        match line {
            Some(InboundLine::Status(packet)) => assert_eq!(packet.fan, Some(PowerState::Off)),
            other => panic!("expected status packet, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_utf8_is_dropped() {
        let line = classify_line(b"boot \xff\xfeok").unwrap();
        assert_eq!(line, Some(InboundLine::Diagnostic("boot ok".to_string())));
    }

    #[test]
    fn test_blank_lines() {
        assert_eq!(classify_line(b"").unwrap(), None);
        assert_eq!(classify_line(b"  \r\n").unwrap(), None);
    }

    #[test]
    fn test_broken_packet_is_error() {
        assert!(matches!(
            classify_line(b"{\"temp\":"),
            Err(Error::MalformedPacket(_))
        ));
    }

    #[test]
    fn test_oversized_line_is_error() {
        let raw = vec![b'a'; MAX_LINE_LENGTH + 1];
        assert!(classify_line(&raw).is_err());
    }
}
