//! Error types for cmnd-link.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! Fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use cmnd_link::{ConnectionPool, EndpointId, Result};
//!
//! async fn example(pool: &ConnectionPool) -> Result<()> {
//!     let delivery = pool.try_send(&EndpointId::default(), "LAMP_ON", true).await?;
//!     println!("delivered after {} attempt(s)", delivery.attempts);
//!     Ok(())
//! }
//! ```
//!
//! The fire-and-forget [`ConnectionPool::send`](crate::ConnectionPool::send)
//! never surfaces these errors; it logs them instead.
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Connection | [`Error::Dial`], [`Error::Write`] |
//! | Configuration | [`Error::Config`], [`Error::UnknownTrigger`] |
//! | Protocol | [`Error::Protocol`] |
//! | External | [`Error::Io`], [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;

use crate::identifiers::{EndpointId, TriggerId};

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Endpoint unreachable or refused at connect time.
    ///
    /// Dial failures are never retried.
    #[error("Failed to connect to {endpoint}: {source}")]
    Dial {
        /// Endpoint that could not be reached.
        endpoint: EndpointId,
        /// Underlying connect error.
        source: IoError,
    },

    /// Writing a frame failed on every permitted attempt.
    #[error("Failed to write to {endpoint} after {attempts} attempt(s): {source}")]
    Write {
        /// Endpoint the frame was addressed to.
        endpoint: EndpointId,
        /// Number of write attempts made.
        attempts: u8,
        /// Error from the last attempt.
        source: IoError,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid bindings configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// No handler is registered for the trigger.
    #[error("Unknown trigger: {trigger}")]
    UnknownTrigger {
        /// The unregistered trigger.
        trigger: TriggerId,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Malformed frame.
    ///
    /// Only raised by the receiver-side frame reader.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a dial error.
    #[inline]
    pub fn dial(endpoint: EndpointId, source: IoError) -> Self {
        Self::Dial { endpoint, source }
    }

    /// Creates a write error.
    #[inline]
    pub fn write(endpoint: EndpointId, attempts: u8, source: IoError) -> Self {
        Self::Write {
            endpoint,
            attempts,
            source,
        }
    }

    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an unknown trigger error.
    #[inline]
    pub fn unknown_trigger(trigger: TriggerId) -> Self {
        Self::UnknownTrigger { trigger }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if connecting to the endpoint failed.
    #[inline]
    #[must_use]
    pub fn is_dial_failure(&self) -> bool {
        matches!(self, Self::Dial { .. })
    }

    /// Returns `true` if writing a frame failed.
    #[inline]
    #[must_use]
    pub fn is_write_failure(&self) -> bool {
        matches!(self, Self::Write { .. })
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Dial { .. } | Self::Write { .. } | Self::Io(_))
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// A later send may succeed once the endpoint is back.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Dial { .. } | Self::Write { .. })
    }

    /// Returns the endpoint involved, if any.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> Option<&EndpointId> {
        match self {
            Self::Dial { endpoint, .. } | Self::Write { endpoint, .. } => Some(endpoint),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_dial_error_display() {
        let err = Error::dial(
            EndpointId::new("127.0.0.1", 29200),
            IoError::new(ErrorKind::ConnectionRefused, "refused"),
        );
        assert_eq!(
            err.to_string(),
            "Failed to connect to 127.0.0.1::29200: refused"
        );
    }

    #[test]
    fn test_write_error_display() {
        let err = Error::write(
            EndpointId::new("10.0.0.2", 9000),
            2,
            IoError::new(ErrorKind::BrokenPipe, "broken pipe"),
        );
        assert_eq!(
            err.to_string(),
            "Failed to write to 10.0.0.2::9000 after 2 attempt(s): broken pipe"
        );
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("no bindings");
        assert_eq!(err.to_string(), "Configuration error: no bindings");
    }

    #[test]
    fn test_predicates() {
        let dial = Error::dial(
            EndpointId::default(),
            IoError::new(ErrorKind::ConnectionRefused, "refused"),
        );
        let write = Error::write(
            EndpointId::default(),
            1,
            IoError::new(ErrorKind::ConnectionReset, "reset"),
        );
        let config = Error::config("test");

        assert!(dial.is_dial_failure());
        assert!(!dial.is_write_failure());
        assert!(write.is_write_failure());
        assert!(dial.is_connection_error());
        assert!(write.is_recoverable());
        assert!(!config.is_connection_error());
        assert!(!config.is_recoverable());
    }

    #[test]
    fn test_endpoint_accessor() {
        let err = Error::dial(
            EndpointId::new("example.local", 1),
            IoError::new(ErrorKind::TimedOut, "timed out"),
        );
        assert_eq!(err.endpoint(), Some(&EndpointId::new("example.local", 1)));
        assert_eq!(Error::protocol("bad").endpoint(), None);
    }

    #[test]
    fn test_source_is_preserved() {
        use std::error::Error as _;

        let err = Error::dial(
            EndpointId::default(),
            IoError::new(ErrorKind::ConnectionRefused, "refused"),
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
