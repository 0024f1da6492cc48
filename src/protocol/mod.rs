//! CMND wire protocol.
//!
//! Binary, big-endian, one-way framing over a plain TCP stream.
//!
//! | Offset | Size | Field | Value |
//! |--------|------|-------|-------|
//! | 0 | 4 | Magic | `CMND` |
//! | 4 | 4 | Opcode | `00 d2 00 00` (send text command) |
//! | 8 | 4 | Length | `len(payload) + 1 + 13` |
//! | 12 | 2 | Padding | zero |
//! | 14 | N | Payload | message bytes plus `\n` |
//! | 14+N | 1 | Terminator | zero |
//!
//! The remote end never acknowledges a frame.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `frame` | Frame encoder and wire constants |
//! | `reader` | Receiver-side frame decoding |

// ============================================================================
// Submodules
// ============================================================================

/// Frame encoder and wire constants.
pub mod frame;

/// Receiver-side frame decoding.
pub mod reader;

// ============================================================================
// Re-exports
// ============================================================================

pub use frame::{LENGTH_OVERHEAD, encode, encode_str, encoded_len};
pub use reader::{decode, read_frame};
