//! Connection establishment.
//!
//! The pool opens connections through a [`Dialer`]. Production code uses
//! [`TcpDialer`]; any type producing an [`AsyncWrite`] stream can stand in.

// ============================================================================
// Imports
// ============================================================================

use std::io::Result as IoResult;

use async_trait::async_trait;
use tokio::io::AsyncWrite;
use tokio::net::TcpStream;
use tracing::trace;

use crate::identifiers::EndpointId;

// ============================================================================
// Dialer
// ============================================================================

/// Opens write streams to endpoints.
#[async_trait]
pub trait Dialer: Send + Sync + 'static {
    /// Stream type held by the pool.
    type Stream: AsyncWrite + Unpin + Send + 'static;

    /// Connects to `endpoint`.
    async fn dial(&self, endpoint: &EndpointId) -> IoResult<Self::Stream>;
}

// ============================================================================
// TcpDialer
// ============================================================================

/// Plain TCP dialer.
#[derive(Debug, Clone, Copy)]
pub struct TcpDialer {
    nodelay: bool,
}

impl TcpDialer {
    /// Creates a dialer.
    #[inline]
    #[must_use]
    pub const fn new(nodelay: bool) -> Self {
        Self { nodelay }
    }
}

impl Default for TcpDialer {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl Dialer for TcpDialer {
    type Stream = TcpStream;

    async fn dial(&self, endpoint: &EndpointId) -> IoResult<TcpStream> {
        let stream = TcpStream::connect((endpoint.host(), endpoint.port())).await?;
        stream.set_nodelay(self.nodelay)?;

        trace!(%endpoint, local = ?stream.local_addr().ok(), "TCP connection opened");

        Ok(stream)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_tcp_dialer_connects() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let endpoint = EndpointId::from(listener.local_addr().expect("addr"));

        let stream = TcpDialer::default().dial(&endpoint).await.expect("dial");
        assert!(stream.nodelay().expect("nodelay"));

        let (_, peer) = listener.accept().await.expect("accept");
        assert_eq!(Some(peer), stream.local_addr().ok());
    }

    #[tokio::test]
    async fn test_tcp_dialer_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let endpoint = EndpointId::from(listener.local_addr().expect("addr"));
        drop(listener);

        let result = TcpDialer::new(false).dial(&endpoint).await;
        assert!(result.is_err());
    }
}
