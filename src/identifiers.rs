//! Type-safe identifiers.
//!
//! Newtype wrappers keep endpoint keys and trigger names from being mixed
//! with arbitrary strings.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`EndpointId`] | `(host, port)` key of a pooled connection |
//! | [`TriggerId`] | Name of an external trigger (e.g. a key) |

// ============================================================================
// Imports
// ============================================================================

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Default endpoint host (loopback).
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default endpoint port.
pub const DEFAULT_PORT: u16 = 29200;

// ============================================================================
// EndpointId
// ============================================================================

/// Identity of a remote endpoint.
///
/// Used as the connection pool key. Displays as `host::port`; dialers
/// connect to the `(host, port)` pair directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointId {
    host: String,
    port: u16,
}

impl EndpointId {
    /// Creates an endpoint identity.
    #[inline]
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Returns the host.
    #[inline]
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[inline]
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Default for EndpointId {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.host, self.port)
    }
}

impl From<std::net::SocketAddr> for EndpointId {
    fn from(addr: std::net::SocketAddr) -> Self {
        Self::new(addr.ip().to_string(), addr.port())
    }
}

// ============================================================================
// TriggerId
// ============================================================================

/// Name of an external trigger, such as a key.
///
/// Cheap to clone; handlers capture their own copy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriggerId(Arc<str>);

impl TriggerId {
    /// Creates a trigger identifier.
    #[inline]
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Returns the trigger name.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TriggerId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TriggerId {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl Borrow<str> for TriggerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Tests
// ============================================================================
