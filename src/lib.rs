//! cmnd-link - Relay trigger events to CMND receivers over pooled TCP.
//!
//! Each trigger event (a key press, a line on stdin, anything) maps to one
//! text command. The command is wrapped in a small fixed-header binary
//! frame and written to a long-lived TCP connection.
//!
//! # Architecture
//!
//! - **Frame encoder**: pure `message → frame` function, see [`protocol`]
//! - **Connection pool**: one connection per endpoint, lazily dialed,
//!   evicted on write failure, one-shot retry, see [`ConnectionPool`]
//! - **Trigger glue**: JSON bindings and a dispatcher that calls into one
//!   shared pool, see [`trigger`]
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use cmnd_link::{ConnectionPool, EndpointId, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let pool = Arc::new(ConnectionPool::new());
//!     let endpoint = EndpointId::new("127.0.0.1", 29200);
//!
//!     // Fire-and-forget: failures are logged.
//!     pool.send(&endpoint, "LAMP_ON", true).await;
//!
//!     // Same send with the outcome reported.
//!     let delivery = pool.try_send(&endpoint, "LAMP_OFF", true).await?;
//!     println!("sent after {} attempt(s)", delivery.attempts);
//!
//!     pool.dispose_all().await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Endpoint and trigger identifiers |
//! | [`protocol`] | CMND frame encoding and decoding |
//! | [`transport`] | Dialer and connection pool |
//! | [`trigger`] | Bindings and trigger dispatch |

// ============================================================================
// Modules
// ============================================================================

/// Error types and result aliases.
///
/// Fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// CMND wire protocol.
pub mod protocol;

/// TCP transport layer.
///
/// Connection establishment and the endpoint-keyed pool.
pub mod transport;

/// Trigger bindings and dispatch.
pub mod trigger;

// ============================================================================
// Re-exports
// ============================================================================

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{DEFAULT_HOST, DEFAULT_PORT, EndpointId, TriggerId};

// Transport types
pub use transport::{ConnectionPool, Delivery, Dialer, PoolOptions, PoolStats, TcpDialer};

// Trigger types
pub use trigger::{Binding, Bindings, TriggerDispatcher};
