//! TCP transport layer.
//!
//! This module owns outbound connections to CMND receivers.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                          ┌──────────────────┐
//! │  ConnectionPool  │          TCP             │  CMND receiver   │
//! │                  │─────────────────────────►│                  │
//! │  Dialer → stream │    host:port (29200)     │  (no replies)    │
//! └──────────────────┘                          └──────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. First send to an endpoint dials through the [`Dialer`]
//! 2. Later sends reuse the pooled stream
//! 3. A failed write evicts the stream; the next attempt dials again
//! 4. `dispose_all` shuts every stream down at process exit
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `dialer` | Connection establishment |
//! | `options` | Timeouts and socket options |
//! | `pool` | Endpoint-keyed connection pool |

// ============================================================================
// Submodules
// ============================================================================

/// Connection establishment.
pub mod dialer;

/// Pool options.
pub mod options;

/// Connection pool keyed by endpoint.
pub mod pool;

// ============================================================================
// Re-exports
// ============================================================================

pub use dialer::{Dialer, TcpDialer};
pub use options::PoolOptions;
pub use pool::{ConnectionPool, Delivery, MAX_ATTEMPTS, PoolStats};
