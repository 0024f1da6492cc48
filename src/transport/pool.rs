//! Connection pool keyed by endpoint.
//!
//! Holds at most one open connection per [`EndpointId`]. Connections are
//! created lazily on the first send, reused while writes succeed, and
//! evicted as soon as a write fails.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                ConnectionPool                │
//! │  ┌────────────────────────────────────────┐  │
//! │  │ 127.0.0.1::29200 → stream              │  │
//! │  │ 10.0.0.7::29200  → stream              │  │
//! │  └────────────────────────────────────────┘  │
//! │   lookup / dial / write under one mutex      │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Connection States
//!
//! `absent → connecting → open → (write failed | disposed) → absent`
//!
//! A broken connection is never repaired in place; it is dropped from the
//! map and the next attempt dials a fresh one.

// ============================================================================
// Imports
// ============================================================================

use std::collections::hash_map::Entry;
use std::future::Future;
use std::io::{Error as IoError, ErrorKind, Result as IoResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use rustc_hash::FxHashMap;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, error, info, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::EndpointId;
use crate::protocol::frame;

use super::dialer::{Dialer, TcpDialer};
use super::options::PoolOptions;

// ============================================================================
// Constants
// ============================================================================

/// Write attempts per send when retry is allowed: the first plus one retry.
pub const MAX_ATTEMPTS: u8 = 2;

// ============================================================================
// Types
// ============================================================================

/// Successful delivery of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// Write attempts made, `1` or `2`.
    pub attempts: u8,
    /// Whether a new connection was dialed for this send.
    pub dialed: bool,
}

/// Snapshot of pool counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Dial attempts.
    pub dials: u64,
    /// Dial attempts that failed.
    pub dial_failures: u64,
    /// Frame write attempts.
    pub write_attempts: u64,
    /// Frame write attempts that failed.
    pub write_failures: u64,
    /// Connections removed after a failed write.
    pub evictions: u64,
}

#[derive(Debug, Default)]
struct Counters {
    dials: AtomicU64,
    dial_failures: AtomicU64,
    write_attempts: AtomicU64,
    write_failures: AtomicU64,
    evictions: AtomicU64,
}

impl Counters {
    #[inline]
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> PoolStats {
        PoolStats {
            dials: self.dials.load(Ordering::Relaxed),
            dial_failures: self.dial_failures.load(Ordering::Relaxed),
            write_attempts: self.write_attempts.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

// ============================================================================
// ConnectionPool
// ============================================================================

/// Pool of outbound connections, one per endpoint.
///
/// Meant to live for the whole process and be shared by `Arc` across all
/// senders. Concurrent sends serialize on a single mutex, so two sends to
/// the same endpoint never race to open duplicate connections.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use cmnd_link::{ConnectionPool, EndpointId};
///
/// # async fn example() {
/// let pool = Arc::new(ConnectionPool::new());
/// let endpoint = EndpointId::new("127.0.0.1", 29200);
///
/// pool.send(&endpoint, "LAMP_ON", true).await;
///
/// pool.dispose_all().await;
/// # }
/// ```
pub struct ConnectionPool<D: Dialer = TcpDialer> {
    /// Opens new connections.
    dialer: D,

    /// Timeouts and socket options.
    options: PoolOptions,

    /// Open connections by endpoint.
    connections: Mutex<FxHashMap<EndpointId, D::Stream>>,

    /// Send statistics.
    counters: Counters,
}

// ============================================================================
// ConnectionPool - Constructors
// ============================================================================

impl ConnectionPool<TcpDialer> {
    /// Creates an empty TCP pool with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(PoolOptions::default())
    }

    /// Creates an empty TCP pool.
    #[must_use]
    pub fn with_options(options: PoolOptions) -> Self {
        let dialer = TcpDialer::new(options.nodelay);
        Self::with_dialer(dialer, options)
    }
}

impl Default for ConnectionPool<TcpDialer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Dialer> ConnectionPool<D> {
    /// Creates an empty pool that opens connections through `dialer`.
    #[must_use]
    pub fn with_dialer(dialer: D, options: PoolOptions) -> Self {
        Self {
            dialer,
            options,
            connections: Mutex::new(FxHashMap::default()),
            counters: Counters::default(),
        }
    }

    /// Returns the pool options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &PoolOptions {
        &self.options
    }
}

// ============================================================================
// ConnectionPool - Sending
// ============================================================================

impl<D: Dialer> ConnectionPool<D> {
    /// Sends `message` to `endpoint`, fire-and-forget.
    ///
    /// Failures are logged and never returned. See [`try_send`] for the
    /// same operation with a structured result.
    ///
    /// [`try_send`]: Self::try_send
    pub async fn send(&self, endpoint: &EndpointId, message: &str, allow_retry: bool) {
        if let Err(e) = self.try_send(endpoint, message, allow_retry).await {
            error!(%endpoint, error = %e, "Message dropped");
        }
    }

    /// Sends `message` to `endpoint` and reports the outcome.
    ///
    /// Reuses the pooled connection or dials a new one, then writes one
    /// frame. A failed write evicts the connection; with `allow_retry`
    /// the send is attempted once more on a fresh connection.
    ///
    /// # Errors
    ///
    /// - [`Error::Dial`] if connecting fails (never retried)
    /// - [`Error::Write`] if every permitted write attempt fails
    pub async fn try_send(
        &self,
        endpoint: &EndpointId,
        message: &str,
        allow_retry: bool,
    ) -> Result<Delivery> {
        let frame = frame::encode_str(message);
        let max_attempts = if allow_retry { MAX_ATTEMPTS } else { 1 };
        let mut dialed = false;
        let mut attempt = 0;

        let mut connections = self.connections.lock().await;

        loop {
            attempt += 1;

            let stream = match connections.entry(endpoint.clone()) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let stream = self.dial(endpoint).await?;
                    dialed = true;
                    entry.insert(stream)
                }
            };

            Counters::bump(&self.counters.write_attempts);
            let result = bounded(
                self.options.write_timeout,
                "write",
                write_frame(stream, &frame),
            )
            .await;

            let err = match result {
                Ok(()) => {
                    debug!(%endpoint, attempt, bytes = frame.len(), "Frame sent");
                    return Ok(Delivery {
                        attempts: attempt,
                        dialed,
                    });
                }
                Err(e) => e,
            };

            Counters::bump(&self.counters.write_failures);
            warn!(%endpoint, attempt, error = %err, "Failed to send frame");

            if let Some(mut broken) = connections.remove(endpoint) {
                Counters::bump(&self.counters.evictions);
                if let Err(e) = broken.shutdown().await {
                    trace!(%endpoint, error = %e, "Shutdown of broken connection failed");
                }
                debug!(%endpoint, "Connection evicted");
            }

            if attempt >= max_attempts {
                return Err(Error::write(endpoint.clone(), attempt, err));
            }
        }
    }

    /// Opens a connection, honouring the connect timeout.
    async fn dial(&self, endpoint: &EndpointId) -> Result<D::Stream> {
        Counters::bump(&self.counters.dials);

        match bounded(
            self.options.connect_timeout,
            "connect",
            self.dialer.dial(endpoint),
        )
        .await
        {
            Ok(stream) => {
                debug!(%endpoint, "Connection established");
                Ok(stream)
            }
            Err(e) => {
                Counters::bump(&self.counters.dial_failures);
                warn!(%endpoint, error = %e, "Failed to connect");
                Err(Error::dial(endpoint.clone(), e))
            }
        }
    }
}

// ============================================================================
// ConnectionPool - Lifecycle
// ============================================================================

impl<D: Dialer> ConnectionPool<D> {
    /// Empties the pool without closing its connections.
    ///
    /// The detached streams are handed back. Keep them to hold the
    /// sockets open, or drop them to close without a graceful shutdown.
    #[must_use = "dropping the detached streams closes them"]
    pub async fn reset_all(&self) -> Vec<(EndpointId, D::Stream)> {
        let detached: Vec<_> = self.connections.lock().await.drain().collect();
        debug!(count = detached.len(), "Connections detached from pool");
        detached
    }

    /// Shuts down every connection and empties the pool.
    ///
    /// Safe to call on an empty pool. Returns the number of connections
    /// closed.
    pub async fn dispose_all(&self) -> usize {
        let mut connections = self.connections.lock().await;
        let count = connections.len();

        for (endpoint, mut stream) in connections.drain() {
            if let Err(e) = stream.shutdown().await {
                debug!(%endpoint, error = %e, "Shutdown failed, dropping connection");
            }
        }

        info!(count, "Connection pool disposed");
        count
    }
}

// ============================================================================
// ConnectionPool - Inspection
// ============================================================================

impl<D: Dialer> ConnectionPool<D> {
    /// Returns the number of pooled connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.lock().await.len()
    }

    /// Returns `true` if a connection to `endpoint` is pooled.
    pub async fn contains(&self, endpoint: &EndpointId) -> bool {
        self.connections.lock().await.contains_key(endpoint)
    }

    /// Returns a snapshot of the send counters.
    #[inline]
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Writes a whole frame and flushes it.
async fn write_frame<S>(stream: &mut S, frame: &[u8]) -> IoResult<()>
where
    S: tokio::io::AsyncWrite + Unpin,
{
    stream.write_all(frame).await?;
    stream.flush().await
}

/// Runs `op` under an optional deadline.
///
/// An elapsed deadline becomes an [`ErrorKind::TimedOut`] I/O error.
async fn bounded<T, F>(limit: Option<Duration>, what: &'static str, op: F) -> IoResult<T>
where
    F: Future<Output = IoResult<T>>,
{
    match limit {
        Some(limit) => timeout(limit, op).await.unwrap_or_else(|_| {
            Err(IoError::new(
                ErrorKind::TimedOut,
                format!("{what} timed out after {}ms", limit.as_millis()),
            ))
        }),
        None => op.await,
    }
}

// ============================================================================
// Tests
// ============================================================================
