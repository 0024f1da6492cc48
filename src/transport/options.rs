//! Connection pool options.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use cmnd_link::PoolOptions;
//!
//! let options = PoolOptions::new()
//!     .with_connect_timeout(Duration::from_secs(2))
//!     .with_write_timeout(Duration::from_millis(500));
//!
//! assert!(options.nodelay);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// PoolOptions
// ============================================================================

/// Runtime options for a [`ConnectionPool`](crate::ConnectionPool).
///
/// Timeouts default to unset: dial and write then block for as long as the
/// OS allows. Setting them only bounds the wait; a timeout is reported as
/// the same dial or write failure it replaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolOptions {
    /// Upper bound for establishing a connection.
    pub connect_timeout: Option<Duration>,

    /// Upper bound for writing and flushing one frame.
    pub write_timeout: Option<Duration>,

    /// Disable Nagle's algorithm on new TCP connections.
    pub nodelay: bool,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl PoolOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connect_timeout: None,
            write_timeout: None,
            nodelay: true,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl PoolOptions {
    /// Bounds how long a dial may take.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Bounds how long writing one frame may take.
    #[inline]
    #[must_use]
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }

    /// Sets TCP_NODELAY on new connections.
    #[inline]
    #[must_use]
    pub fn with_nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
