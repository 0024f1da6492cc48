//! CMND frame encoding.
//!
//! Every outgoing message is wrapped in a self-describing envelope:
//!
//! ```text
//! ┌────────┬────────┬────────┬─────────┬───────────────────┬────────────┐
//! │ Magic  │ Opcode │ Length │ Padding │ Payload + '\n'    │ Terminator │
//! │ 4 (BE) │ 4      │ u32 BE │ 2 zero  │ N                 │ 1 zero     │
//! └────────┴────────┴────────┴─────────┴───────────────────┴────────────┘
//! ```
//!
//! `Length` is the body length (payload plus newline) plus
//! [`LENGTH_OVERHEAD`]. The receiver expects exactly this value.

// ============================================================================
// Imports
// ============================================================================

use bytes::{BufMut, Bytes, BytesMut};

// ============================================================================
// Constants
// ============================================================================

/// Protocol magic, ASCII `CMND`.
pub const MAGIC: [u8; 4] = *b"CMND";

/// Opcode for the "send text command" operation.
pub const OPCODE: [u8; 4] = [0x00, 0xd2, 0x00, 0x00];

/// Magic followed by opcode.
pub const HEADER: [u8; 8] = [
    MAGIC[0], MAGIC[1], MAGIC[2], MAGIC[3], OPCODE[0], OPCODE[1], OPCODE[2], OPCODE[3],
];

/// Zero padding between the length field and the body.
pub const PADDING: [u8; 2] = [0x00, 0x00];

/// Trailing byte closing every frame.
pub const TERMINATOR: u8 = 0x00;

/// Newline appended to the payload to form the command body.
pub const COMMAND_DELIMITER: u8 = b'\n';

/// Fixed amount the receiver counts into `Length` beyond the body.
///
/// Wire constant; must not change.
pub const LENGTH_OVERHEAD: u32 = 13;

/// Size of the length field.
pub const LENGTH_FIELD_LEN: usize = 4;

/// Bytes before the body: header, length and padding.
pub const PREFIX_LEN: usize = HEADER.len() + LENGTH_FIELD_LEN + PADDING.len();

/// Total frame size for a payload of `payload_len` bytes.
#[inline]
#[must_use]
pub const fn encoded_len(payload_len: usize) -> usize {
    PREFIX_LEN + payload_len + 1 + 1
}

// ============================================================================
// Encoding
// ============================================================================

/// Encodes a payload into a complete frame.
///
/// Pure and total: any payload, including an empty one, yields a valid
/// frame. Length values beyond `u32::MAX` saturate.
#[must_use]
pub fn encode(payload: &[u8]) -> Bytes {
    let body_len = payload.len() + 1;
    let length = u32::try_from(body_len)
        .unwrap_or(u32::MAX)
        .saturating_add(LENGTH_OVERHEAD);

    let mut frame = BytesMut::with_capacity(encoded_len(payload.len()));
    frame.put_slice(&HEADER);
    frame.put_u32(length);
    frame.put_slice(&PADDING);
    frame.put_slice(payload);
    frame.put_u8(COMMAND_DELIMITER);
    frame.put_u8(TERMINATOR);

    frame.freeze()
}

/// Encodes a text message into a complete frame.
#[inline]
#[must_use]
pub fn encode_str(message: &str) -> Bytes {
    encode(message.as_bytes())
}

/// Reads the length field of a frame prefix.
///
/// Returns `None` if `bytes` is shorter than header plus length field.
#[inline]
#[must_use]
pub fn length_field(bytes: &[u8]) -> Option<u32> {
    let field = bytes.get(HEADER.len()..HEADER.len() + LENGTH_FIELD_LEN)?;
    let mut raw = [0u8; LENGTH_FIELD_LEN];
    raw.copy_from_slice(field);
    Some(u32::from_be_bytes(raw))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_constants() {
        assert_eq!(&HEADER, &[0x43, 0x4d, 0x4e, 0x44, 0x00, 0xd2, 0x00, 0x00]);
        assert_eq!(PREFIX_LEN, 14);
        assert_eq!(LENGTH_OVERHEAD, 13);
    }

    #[test]
    fn test_lamp_on_frame() {
        let frame = encode_str("LAMP_ON");

        let mut expected = Vec::new();
        expected.extend_from_slice(b"CMND");
        expected.extend_from_slice(&[0x00, 0xd2, 0x00, 0x00]);
        expected.extend_from_slice(&21u32.to_be_bytes());
        expected.extend_from_slice(&[0x00, 0x00]);
        expected.extend_from_slice(b"LAMP_ON\n");
        expected.push(0x00);

        assert_eq!(frame.as_ref(), expected.as_slice());
        assert_eq!(length_field(&frame), Some(21));
    }

    #[test]
    fn test_empty_payload() {
        let frame = encode(&[]);
        assert_eq!(frame.len(), 16);
        assert_eq!(length_field(&frame), Some(14));
        assert_eq!(&frame[PREFIX_LEN..], &[b'\n', 0x00]);
    }

    #[test]
    fn test_length_field_short_input() {
        assert_eq!(length_field(&HEADER), None);
        assert_eq!(length_field(&[]), None);
    }

    #[test]
    fn test_frames_are_independent() {
        let a = encode_str("A");
        let b = encode_str("B");
        assert_ne!(a, b);
        assert_eq!(a, encode_str("A"));
    }

    proptest! {
        #[test]
        fn prop_frame_layout(payload in proptest::collection::vec(any::<u8>(), 0..512)) {
            let frame = encode(&payload);

            prop_assert_eq!(frame.len(), 14 + payload.len() + 1 + 1);
            prop_assert_eq!(frame.len(), encoded_len(payload.len()));
            prop_assert_eq!(&frame[PREFIX_LEN..PREFIX_LEN + payload.len()], payload.as_slice());
            prop_assert_eq!(frame[PREFIX_LEN + payload.len()], b'\n');
            prop_assert_eq!(frame[frame.len() - 1], 0x00);
            prop_assert_eq!(length_field(&frame), Some(payload.len() as u32 + 1 + 13));
        }

        #[test]
        fn prop_header_and_padding_are_constant(message in ".{0,64}") {
            let frame = encode_str(&message);

            prop_assert_eq!(&frame[..8], &HEADER[..]);
            prop_assert_eq!(&frame[12..14], &PADDING[..]);
        }
    }
}
