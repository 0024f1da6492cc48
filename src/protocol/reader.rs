//! Receiver-side frame decoding.
//!
//! The client never reads from its connections. These helpers exist for
//! the demo sink and for tests that stand in for the remote endpoint.

// ============================================================================
// Imports
// ============================================================================

use std::io::ErrorKind;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::trace;

use crate::error::{Error, Result};

use super::frame::{
    COMMAND_DELIMITER, HEADER, LENGTH_FIELD_LEN, LENGTH_OVERHEAD, PADDING, PREFIX_LEN, TERMINATOR,
    length_field,
};

// ============================================================================
// Constants
// ============================================================================

/// Largest frame the reader accepts.
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Header plus length field; enough to know the full frame size.
const SIZE_PREFIX_LEN: usize = HEADER.len() + LENGTH_FIELD_LEN;

// ============================================================================
// Decoding
// ============================================================================

/// Validates a complete frame and returns its payload.
///
/// The returned slice excludes the trailing newline.
///
/// # Errors
///
/// Returns [`Error::Protocol`] if the header, length, padding, newline or
/// terminator do not match the wire format.
pub fn decode(frame: &[u8]) -> Result<&[u8]> {
    if frame.len() < SIZE_PREFIX_LEN {
        return Err(Error::protocol(format!(
            "Frame too short: {} bytes",
            frame.len()
        )));
    }

    let total = expected_total_len(&frame[..SIZE_PREFIX_LEN])?;
    if frame.len() != total {
        return Err(Error::protocol(format!(
            "Frame length mismatch: header says {total} bytes, got {}",
            frame.len()
        )));
    }

    if frame[HEADER.len() + LENGTH_FIELD_LEN..PREFIX_LEN] != PADDING {
        return Err(Error::protocol("Non-zero padding"));
    }

    if frame[total - 1] != TERMINATOR {
        return Err(Error::protocol("Missing frame terminator"));
    }

    if frame[total - 2] != COMMAND_DELIMITER {
        return Err(Error::protocol("Missing command delimiter"));
    }

    Ok(&frame[PREFIX_LEN..total - 2])
}

/// Reads one frame from `reader` and returns its payload.
///
/// Returns `Ok(None)` on a clean EOF before the first byte of a frame.
///
/// # Errors
///
/// - [`Error::Protocol`] if the frame is malformed, oversized or truncated
/// - [`Error::Io`] on any other read failure
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Bytes>>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; SIZE_PREFIX_LEN];
    let mut filled = 0;

    while filled < SIZE_PREFIX_LEN {
        let n = reader.read(&mut prefix[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(Error::protocol("Connection closed mid-frame"));
        }
        filled += n;
    }

    let total = expected_total_len(&prefix)?;
    if total > MAX_FRAME_LEN {
        return Err(Error::protocol(format!(
            "Frame too large: {total} bytes (max {MAX_FRAME_LEN})"
        )));
    }

    let mut buf = BytesMut::zeroed(total);
    buf[..SIZE_PREFIX_LEN].copy_from_slice(&prefix);
    reader
        .read_exact(&mut buf[SIZE_PREFIX_LEN..])
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => Error::protocol("Connection closed mid-frame"),
            _ => Error::Io(e),
        })?;

    let frame = buf.freeze();
    let payload_len = decode(&frame)?.len();
    trace!(bytes = total, "Frame received");

    Ok(Some(frame.slice(PREFIX_LEN..PREFIX_LEN + payload_len)))
}

/// Computes the full frame size from header and length field.
fn expected_total_len(prefix: &[u8]) -> Result<usize> {
    if prefix[..HEADER.len()] != HEADER {
        return Err(Error::protocol("Unknown magic or opcode"));
    }

    let length = length_field(prefix).ok_or_else(|| Error::protocol("Missing length field"))?;
    // Body holds at least the newline.
    if length < LENGTH_OVERHEAD + 1 {
        return Err(Error::protocol(format!("Length field too small: {length}")));
    }

    let body_len = (length - LENGTH_OVERHEAD) as usize;
    Ok(PREFIX_LEN + body_len + 1)
}

// ============================================================================
// Tests
// ============================================================================
