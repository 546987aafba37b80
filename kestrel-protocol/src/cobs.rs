//! Consistent Overhead Byte Stuffing
//!
//! Packet layout handled here:
//!
//! ```text
//! ┌──────────┬──────────────────────┬───────────┐
//! │ OVERHEAD │ PAYLOAD (1-254B)     │ DELIMITER │
//! └──────────┴──────────────────────┴───────────┘
//! ```
//!
//! Encoding replaces every delimiter-valued payload byte with the distance to
//! the next delimiter-valued byte, with the trailing delimiter closing the
//! chain. The overhead byte holds the distance to the first link. Both
//! directions work in place on the caller's buffer.

use core::fmt;

/// Value that marks the end of every packet
pub const DELIMITER: u8 = 0;

/// Largest payload the overhead byte can address
pub const MAX_PAYLOAD_SIZE: usize = 254;

/// Bytes added around the payload (overhead + delimiter)
pub const COBS_OVERHEAD: usize = 2;

/// COBS encoding and decoding failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CobsError {
    /// Payload is empty
    PayloadTooSmall,
    /// Payload exceeds [`MAX_PAYLOAD_SIZE`]
    PayloadTooLarge,
    /// Buffer cannot hold overhead + payload + delimiter
    BufferTooSmall,
    /// The chain of distances never reaches the trailing delimiter
    DelimiterNotFound,
    /// A delimiter appears before the end of the packet
    DelimiterFoundTooEarly,
}

impl CobsError {
    /// Status code reported to the host
    pub fn code(self) -> u8 {
        match self {
            CobsError::PayloadTooSmall => 12,
            CobsError::PayloadTooLarge => 13,
            CobsError::BufferTooSmall => 14,
            CobsError::DelimiterNotFound => 20,
            CobsError::DelimiterFoundTooEarly => 21,
        }
    }
}

impl fmt::Display for CobsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CobsError::PayloadTooSmall => write!(f, "payload is empty"),
            CobsError::PayloadTooLarge => {
                write!(f, "payload exceeds {} bytes", MAX_PAYLOAD_SIZE)
            }
            CobsError::BufferTooSmall => write!(f, "buffer too small for packet"),
            CobsError::DelimiterNotFound => write!(f, "packet delimiter not found"),
            CobsError::DelimiterFoundTooEarly => {
                write!(f, "delimiter found before end of packet")
            }
        }
    }
}

/// Encode `payload_len` bytes stored at `packet[1..]` in place.
///
/// `packet[0]` receives the overhead byte and `packet[payload_len + 1]` the
/// delimiter. Returns the encoded packet size (`payload_len + 2`).
pub fn encode(packet: &mut [u8], payload_len: usize) -> Result<usize, CobsError> {
    if payload_len == 0 {
        return Err(CobsError::PayloadTooSmall);
    }
    if payload_len > MAX_PAYLOAD_SIZE {
        return Err(CobsError::PayloadTooLarge);
    }
    let packet_len = payload_len + COBS_OVERHEAD;
    if packet.len() < packet_len {
        return Err(CobsError::BufferTooSmall);
    }

    let end = payload_len + 1;
    packet[end] = DELIMITER;

    // Walk backwards so every delimiter learns the distance to the next one
    let mut next = end;
    for index in (1..end).rev() {
        if packet[index] == DELIMITER {
            packet[index] = (next - index) as u8;
            next = index;
        }
    }
    packet[0] = next as u8;

    Ok(packet_len)
}

/// Decode a packet (overhead through delimiter) in place.
///
/// On success the payload is restored at `packet[1..=len]` and its length is
/// returned. The overhead byte is cleared.
pub fn decode(packet: &mut [u8]) -> Result<usize, CobsError> {
    if packet.len() <= COBS_OVERHEAD {
        return Err(CobsError::PayloadTooSmall);
    }
    if packet.len() > MAX_PAYLOAD_SIZE + COBS_OVERHEAD {
        return Err(CobsError::PayloadTooLarge);
    }

    let end = packet.len() - 1;
    if packet[end] != DELIMITER {
        return Err(CobsError::DelimiterNotFound);
    }
    if packet[..end].contains(&DELIMITER) {
        return Err(CobsError::DelimiterFoundTooEarly);
    }

    let mut index = usize::from(packet[0]);
    while index < end {
        let distance = usize::from(packet[index]);
        packet[index] = DELIMITER;
        index += distance;
    }
    if index != end {
        return Err(CobsError::DelimiterNotFound);
    }

    packet[0] = DELIMITER;
    Ok(end - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn encoded(payload: &[u8]) -> ([u8; MAX_PAYLOAD_SIZE + 2], usize) {
        let mut packet = [0u8; MAX_PAYLOAD_SIZE + 2];
        packet[1..=payload.len()].copy_from_slice(payload);
        let len = encode(&mut packet, payload.len()).unwrap();
        (packet, len)
    }

    #[test]
    fn test_encode_known_vector() {
        let (packet, len) = encoded(&[1, 0, 2, 0]);
        assert_eq!(len, 6);
        assert_eq!(&packet[..len], &[2, 1, 2, 2, 1, 0]);
    }

    #[test]
    fn test_encode_without_delimiters() {
        let (packet, len) = encoded(&[5, 6]);
        assert_eq!(&packet[..len], &[3, 5, 6, 0]);
    }

    #[test]
    fn test_all_delimiter_payload() {
        let (mut packet, len) = encoded(&[0, 0, 0]);
        assert_eq!(&packet[..len], &[1, 1, 1, 1, 0]);

        assert_eq!(decode(&mut packet[..len]), Ok(3));
        assert_eq!(&packet[1..4], &[0, 0, 0]);
    }

    #[test]
    fn test_maximum_payload() {
        let payload = [0u8; MAX_PAYLOAD_SIZE];
        let (mut packet, len) = encoded(&payload);
        assert_eq!(len, MAX_PAYLOAD_SIZE + 2);
        assert_eq!(decode(&mut packet[..len]), Ok(MAX_PAYLOAD_SIZE));
    }

    #[test]
    fn test_empty_payload_rejected() {
        let mut packet = [0u8; 4];
        assert_eq!(encode(&mut packet, 0), Err(CobsError::PayloadTooSmall));
        assert_eq!(decode(&mut packet[..2]), Err(CobsError::PayloadTooSmall));
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let mut packet = [1u8; MAX_PAYLOAD_SIZE + 3];
        assert_eq!(
            encode(&mut packet, MAX_PAYLOAD_SIZE + 1),
            Err(CobsError::PayloadTooLarge)
        );
    }

    #[test]
    fn test_buffer_too_small() {
        let mut packet = [1u8; 4];
        assert_eq!(encode(&mut packet, 3), Err(CobsError::BufferTooSmall));
    }

    #[test]
    fn test_decode_rejects_early_delimiter() {
        // Unencoded payload still holds a raw delimiter
        let mut packet = [3, 1, 0, 2, 0];
        assert_eq!(decode(&mut packet), Err(CobsError::DelimiterFoundTooEarly));
    }

    #[test]
    fn test_decode_rejects_broken_chain() {
        // Overhead jumps past the delimiter
        let mut packet = [9, 1, 2, 3, 0];
        assert_eq!(decode(&mut packet), Err(CobsError::DelimiterNotFound));

        let mut packet = [2, 1, 2, 3, 7];
        assert_eq!(decode(&mut packet), Err(CobsError::DelimiterNotFound));
    }

    proptest! {
        #[test]
        fn prop_roundtrip(payload in proptest::collection::vec(any::<u8>(), 1..=MAX_PAYLOAD_SIZE)) {
            let (mut packet, len) = encoded(&payload);
            prop_assert_eq!(decode(&mut packet[..len]), Ok(payload.len()));
            prop_assert_eq!(&packet[1..=payload.len()], &payload[..]);
        }

        #[test]
        fn prop_encoded_body_has_no_delimiter(payload in proptest::collection::vec(any::<u8>(), 1..=MAX_PAYLOAD_SIZE)) {
            let (packet, len) = encoded(&payload);
            prop_assert!(!packet[..len - 1].contains(&DELIMITER));
            prop_assert_eq!(packet[len - 1], DELIMITER);
        }
    }
}
