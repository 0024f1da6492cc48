//! Trigger dispatch.
//!
//! Turns trigger events into sends on one shared [`ConnectionPool`].
//!
//! Each registered trigger gets its own handler closure that owns its
//! `(trigger, message)` pair, so handlers never observe each other's data.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use cmnd_link::{Bindings, ConnectionPool, TriggerDispatcher};
//!
//! # async fn example() -> cmnd_link::Result<()> {
//! let bindings = Bindings::from_path("bindings.json")?;
//! let pool = Arc::new(ConnectionPool::new());
//! let dispatcher = TriggerDispatcher::from_bindings(Arc::clone(&pool), &bindings);
//!
//! dispatcher.fire("F1").await?;
//!
//! dispatcher.shutdown().await;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use futures_util::future::BoxFuture;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::identifiers::{EndpointId, TriggerId};
use crate::transport::{ConnectionPool, Delivery, Dialer, TcpDialer};

use super::bindings::Bindings;

// ============================================================================
// Types
// ============================================================================

/// Handler invoked when a trigger fires.
///
/// Takes the dispatcher's current retry setting and returns the outcome
/// of the send it performs.
pub type TriggerHandler =
    Arc<dyn Fn(bool) -> BoxFuture<'static, Result<Delivery>> + Send + Sync>;

// ============================================================================
// TriggerDispatcher
// ============================================================================

/// Routes trigger events to their bound messages.
///
/// All handlers share the pool passed in at construction, so repeated
/// triggers reuse one connection per endpoint.
pub struct TriggerDispatcher<D: Dialer = TcpDialer> {
    /// Shared connection pool.
    pool: Arc<ConnectionPool<D>>,

    /// Endpoint every handler sends to.
    endpoint: EndpointId,

    /// Whether handlers retry once on write failure.
    allow_retry: bool,

    /// Handlers by trigger.
    handlers: RwLock<FxHashMap<TriggerId, TriggerHandler>>,

    /// Sends started by `spawn_fire`.
    tasks: TaskTracker,
}

// ============================================================================
// TriggerDispatcher - Constructors
// ============================================================================

impl<D: Dialer> TriggerDispatcher<D> {
    /// Creates a dispatcher with no triggers registered.
    ///
    /// Retry on write failure is enabled.
    #[must_use]
    pub fn new(pool: Arc<ConnectionPool<D>>, endpoint: EndpointId) -> Self {
        Self {
            pool,
            endpoint,
            allow_retry: true,
            handlers: RwLock::new(FxHashMap::default()),
            tasks: TaskTracker::new(),
        }
    }

    /// Creates a dispatcher with every binding registered.
    #[must_use]
    pub fn from_bindings(pool: Arc<ConnectionPool<D>>, bindings: &Bindings) -> Self {
        let dispatcher = Self::new(pool, bindings.endpoint().clone());
        for binding in bindings {
            dispatcher.register(binding.trigger.clone(), Arc::clone(&binding.message));
        }
        dispatcher
    }

    /// Enables or disables the one-shot retry.
    ///
    /// Applies to every handler, including those already registered.
    #[inline]
    #[must_use]
    pub fn with_retry(mut self, allow_retry: bool) -> Self {
        self.allow_retry = allow_retry;
        self
    }
}

// ============================================================================
// TriggerDispatcher - Registration
// ============================================================================

impl<D: Dialer> TriggerDispatcher<D> {
    /// Registers `message` for `trigger`.
    ///
    /// Returns `true` if an earlier handler for the trigger was replaced.
    pub fn register(&self, trigger: impl Into<TriggerId>, message: impl Into<Arc<str>>) -> bool {
        let trigger = trigger.into();
        let handler = self.bind(trigger.clone(), message.into());

        let replaced = self.handlers.write().insert(trigger.clone(), handler).is_some();
        debug!(%trigger, replaced, "Trigger registered");
        replaced
    }

    /// Removes the handler for `trigger`.
    ///
    /// Returns `true` if a handler was registered.
    pub fn unregister(&self, trigger: &str) -> bool {
        self.handlers.write().remove(trigger).is_some()
    }

    /// Returns the registered triggers, sorted.
    #[must_use]
    pub fn triggers(&self) -> Vec<TriggerId> {
        let mut triggers: Vec<_> = self.handlers.read().keys().cloned().collect();
        triggers.sort();
        triggers
    }

    /// Builds a handler that owns its trigger and message.
    fn bind(&self, trigger: TriggerId, message: Arc<str>) -> TriggerHandler {
        let pool = Arc::clone(&self.pool);
        let endpoint = self.endpoint.clone();

        Arc::new(move |allow_retry| -> BoxFuture<'static, Result<Delivery>> {
            let pool = Arc::clone(&pool);
            let endpoint = endpoint.clone();
            let trigger = trigger.clone();
            let message = Arc::clone(&message);

            Box::pin(async move {
                info!(%trigger, %message, "Trigger fired, sending message");
                pool.try_send(&endpoint, &message, allow_retry).await
            })
        })
    }
}

// ============================================================================
// TriggerDispatcher - Dispatch
// ============================================================================

impl<D: Dialer> TriggerDispatcher<D> {
    /// Sends the message bound to `trigger` and waits for the outcome.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownTrigger`] if nothing is registered for `trigger`
    /// - [`Error::Dial`] or [`Error::Write`] from the send
    pub async fn fire(&self, trigger: &str) -> Result<Delivery> {
        let handler = self
            .handlers
            .read()
            .get(trigger)
            .cloned()
            .ok_or_else(|| Error::unknown_trigger(TriggerId::new(trigger)))?;

        handler(self.allow_retry).await
    }

    /// Fires `trigger` on a background task, fire-and-forget.
    ///
    /// Failures are logged. The task is tracked, so [`shutdown`] waits
    /// for it. Returns `None` if the trigger is unknown.
    ///
    /// [`shutdown`]: Self::shutdown
    pub fn spawn_fire(&self, trigger: &str) -> Option<JoinHandle<()>> {
        // Spawn under the read lock: shutdown clears handlers under the
        // write lock, so every task spawned before that is tracked.
        let handlers = self.handlers.read();
        let Some(handler) = handlers.get(trigger).cloned() else {
            warn!(trigger, "Unknown trigger ignored");
            return None;
        };

        let allow_retry = self.allow_retry;
        let trigger = trigger.to_string();
        Some(self.tasks.spawn(async move {
            if let Err(e) = handler(allow_retry).await {
                warn!(%trigger, error = %e, "Trigger not delivered");
            }
        }))
    }
}

// ============================================================================
// TriggerDispatcher - Lifecycle
// ============================================================================

impl<D: Dialer> TriggerDispatcher<D> {
    /// Returns the shared pool.
    #[inline]
    #[must_use]
    pub fn pool(&self) -> &Arc<ConnectionPool<D>> {
        &self.pool
    }

    /// Returns the target endpoint.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &EndpointId {
        &self.endpoint
    }

    /// Drops all handlers, waits for spawned fires, then disposes the pool.
    ///
    /// Returns the number of connections closed.
    pub async fn shutdown(&self) -> usize {
        self.handlers.write().clear();

        self.tasks.close();
        if !self.tasks.is_empty() {
            debug!(pending = self.tasks.len(), "Waiting for in-flight fires");
        }
        self.tasks.wait().await;

        self.pool.dispose_all().await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeSet;
    use std::io::{self, Result as IoResult};
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use async_trait::async_trait;
    use tokio::io::AsyncWrite;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;
    use tokio_test::{assert_err, assert_ok};

    use crate::protocol::read_frame;
    use crate::transport::PoolOptions;

    /// Stream whose writes always fail with a broken pipe.
    struct BrokenStream;

    impl AsyncWrite for BrokenStream {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<IoResult<usize>> {
            Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<IoResult<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<IoResult<()>> {
            Poll::Ready(Ok(()))
        }
    }

    /// Dials successfully, then every write fails.
    struct BrokenDialer;

    #[async_trait]
    impl Dialer for BrokenDialer {
        type Stream = BrokenStream;

        async fn dial(&self, _endpoint: &EndpointId) -> IoResult<Self::Stream> {
            Ok(BrokenStream)
        }
    }

    /// Accepts connections and forwards each decoded payload as text.
    async fn spawn_sink() -> (EndpointId, mpsc::UnboundedReceiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let endpoint = EndpointId::from(listener.local_addr().expect("addr"));
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let tx = tx.clone();
                tokio::spawn(async move {
                    while let Ok(Some(payload)) = read_frame(&mut stream).await {
                        let _ = tx.send(String::from_utf8_lossy(&payload).into_owned());
                    }
                });
            }
        });

        (endpoint, rx)
    }

    #[tokio::test]
    async fn test_bindings_fire_their_messages() {
        let (endpoint, mut rx) = spawn_sink().await;
        let bindings = assert_ok!(Bindings::new(
            endpoint,
            [("F1", "LAMP_ON"), ("F2", "LAMP_OFF")]
        ));
        let pool = Arc::new(ConnectionPool::new());
        let dispatcher = TriggerDispatcher::from_bindings(Arc::clone(&pool), &bindings);

        assert_ok!(dispatcher.fire("F2").await);
        assert_ok!(dispatcher.fire("F1").await);

        assert_eq!(rx.recv().await.as_deref(), Some("LAMP_OFF"));
        assert_eq!(rx.recv().await.as_deref(), Some("LAMP_ON"));

        // One long-lived pool, one connection across events.
        assert_eq!(pool.stats().dials, 1);
        assert_eq!(dispatcher.triggers(), [TriggerId::new("F1"), TriggerId::new("F2")]);
    }

    #[tokio::test]
    async fn test_unknown_trigger() {
        let pool = Arc::new(ConnectionPool::new());
        let dispatcher = TriggerDispatcher::new(pool, EndpointId::default());

        let err = assert_err!(dispatcher.fire("nope").await);
        assert!(matches!(err, Error::UnknownTrigger { .. }));
        assert!(dispatcher.spawn_fire("nope").is_none());
    }

    #[tokio::test]
    async fn test_handlers_capture_their_own_pair() {
        let (endpoint, mut rx) = spawn_sink().await;
        let dispatcher = TriggerDispatcher::new(Arc::new(ConnectionPool::new()), endpoint);

        for i in 0..5 {
            dispatcher.register(format!("K{i}"), format!("MSG_{i}"));
        }
        for i in (0..5).rev() {
            assert_ok!(dispatcher.fire(&format!("K{i}")).await);
        }

        for i in (0..5).rev() {
            assert_eq!(rx.recv().await, Some(format!("MSG_{i}")));
        }
    }

    #[tokio::test]
    async fn test_register_replaces_and_unregister_removes() {
        let (endpoint, mut rx) = spawn_sink().await;
        let dispatcher = TriggerDispatcher::new(Arc::new(ConnectionPool::new()), endpoint);

        assert!(!dispatcher.register("F1", "OLD"));
        assert!(dispatcher.register("F1", "NEW"));
        assert_ok!(dispatcher.fire("F1").await);
        assert_eq!(rx.recv().await.as_deref(), Some("NEW"));

        assert!(dispatcher.unregister("F1"));
        assert!(!dispatcher.unregister("F1"));
        assert_err!(dispatcher.fire("F1").await);
    }

    #[tokio::test]
    async fn test_spawn_fire_concurrently() {
        let (endpoint, mut rx) = spawn_sink().await;
        let pool = Arc::new(ConnectionPool::new());
        let dispatcher = TriggerDispatcher::new(Arc::clone(&pool), endpoint);
        dispatcher.register("A", "ALPHA");
        dispatcher.register("B", "BRAVO");

        let handles: Vec<_> = ["A", "B", "A", "B"]
            .into_iter()
            .filter_map(|t| dispatcher.spawn_fire(t))
            .collect();
        for handle in handles {
            handle.await.expect("join");
        }

        let mut seen = BTreeSet::new();
        for _ in 0..4 {
            seen.insert(rx.recv().await.expect("frame"));
        }
        assert_eq!(seen, BTreeSet::from(["ALPHA".to_string(), "BRAVO".to_string()]));
        assert_eq!(pool.stats().dials, 1);
    }

    #[tokio::test]
    async fn test_fire_reports_dial_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let endpoint = EndpointId::from(listener.local_addr().expect("addr"));
        drop(listener);

        let dispatcher = TriggerDispatcher::new(Arc::new(ConnectionPool::new()), endpoint)
            .with_retry(false);
        dispatcher.register("F1", "LAMP_ON");

        let err = assert_err!(dispatcher.fire("F1").await);
        assert!(err.is_dial_failure());
    }

    #[tokio::test]
    async fn test_with_retry_applies_to_registered_handlers() {
        let bindings = assert_ok!(Bindings::new(EndpointId::default(), [("F1", "LAMP_ON")]));
        let pool = Arc::new(ConnectionPool::with_dialer(BrokenDialer, PoolOptions::default()));
        let dispatcher =
            TriggerDispatcher::from_bindings(Arc::clone(&pool), &bindings).with_retry(false);

        let err = assert_err!(dispatcher.fire("F1").await);
        assert!(err.is_write_failure());
        assert_eq!(pool.stats().write_attempts, 1);

        // Spawned fires read the setting too.
        dispatcher.spawn_fire("F1").expect("known trigger").await.expect("join");
        assert_eq!(pool.stats().write_attempts, 2);
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_spawned_fires() {
        let (endpoint, mut rx) = spawn_sink().await;
        let pool = Arc::new(ConnectionPool::new());
        let dispatcher = TriggerDispatcher::new(Arc::clone(&pool), endpoint);
        dispatcher.register("F1", "LAMP_ON");

        let handle = dispatcher.spawn_fire("F1").expect("known trigger");

        assert_eq!(dispatcher.shutdown().await, 1);
        assert_eq!(pool.connection_count().await, 0);
        handle.await.expect("join");
        assert_eq!(rx.recv().await.as_deref(), Some("LAMP_ON"));
    }

    #[tokio::test]
    async fn test_shutdown_disposes_pool() {
        let (endpoint, mut rx) = spawn_sink().await;
        let pool = Arc::new(ConnectionPool::new());
        let dispatcher = TriggerDispatcher::new(Arc::clone(&pool), endpoint);
        dispatcher.register("F1", "LAMP_ON");

        assert_ok!(dispatcher.fire("F1").await);
        assert_eq!(rx.recv().await.as_deref(), Some("LAMP_ON"));

        assert_eq!(dispatcher.shutdown().await, 1);
        assert_eq!(pool.connection_count().await, 0);
        assert!(dispatcher.triggers().is_empty());
    }
}
