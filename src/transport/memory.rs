//! In-process transport.
//!
//! [`MemoryTransport`] hands every connection attempt to a
//! [`MemoryServer`], which plays the remote side: it decides when the
//! connection opens, pushes requests, reads responses and closes or fails
//! the connection. Useful for testing procedures and reconnect behaviour
//! without sockets.
//!
//! # Example
//!
//! ```ignore
//! let (transport, mut server) = MemoryTransport::new();
//! let endpoint = Endpoint::builder()
//!     .address("ws://memory/ws")
//!     .transport(transport)
//!     .build()?;
//! endpoint.start();
//!
//! let peer = server.accept().await.expect("connect attempt");
//! peer.open();
//! peer.send_text(r#"{"id":"r1","action":"getRegisteredMethods","params":[]}"#);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::mpsc;
use url::Url;

use crate::identifiers::ConnectionId;

use super::{CloseCode, OutboundFrame, Transport, TransportEvent, TransportHandle};

// ============================================================================
// MemoryTransport
// ============================================================================

/// Transport whose connections are served in-process.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    /// Delivers new connection attempts to the server side.
    accept_tx: mpsc::UnboundedSender<MemoryPeer>,
    /// Number of `open` calls.
    opens: Arc<AtomicUsize>,
}

impl MemoryTransport {
    /// Creates a transport and the server that receives its connections.
    #[must_use]
    pub fn new() -> (Self, MemoryServer) {
        let (accept_tx, accept_rx) = mpsc::unbounded_channel();
        let opens = Arc::new(AtomicUsize::new(0));
        let transport = Self {
            accept_tx,
            opens: Arc::clone(&opens),
        };
        let server = MemoryServer { accept_rx, opens };
        (transport, server)
    }
}

impl Transport for MemoryTransport {
    fn open(&self, address: &Url) -> TransportHandle {
        let (handle, events, frames) = TransportHandle::channel();
        self.opens.fetch_add(1, Ordering::SeqCst);

        // An unattended server leaves the attempt pending forever
        let _ = self.accept_tx.send(MemoryPeer {
            id: handle.id(),
            address: address.clone(),
            events,
            frames,
        });

        handle
    }
}

// ============================================================================
// MemoryServer
// ============================================================================

/// Server side of a [`MemoryTransport`].
#[derive(Debug)]
pub struct MemoryServer {
    accept_rx: mpsc::UnboundedReceiver<MemoryPeer>,
    opens: Arc<AtomicUsize>,
}

impl MemoryServer {
    /// Waits for the next connection attempt.
    ///
    /// Returns `None` once every transport clone is dropped.
    pub async fn accept(&mut self) -> Option<MemoryPeer> {
        self.accept_rx.recv().await
    }

    /// Returns a pending connection attempt without waiting.
    pub fn try_accept(&mut self) -> Option<MemoryPeer> {
        self.accept_rx.try_recv().ok()
    }

    /// Returns the number of connection attempts made so far.
    #[inline]
    #[must_use]
    pub fn connect_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

// ============================================================================
// MemoryPeer
// ============================================================================

/// Remote side of one in-process connection.
#[derive(Debug)]
pub struct MemoryPeer {
    id: ConnectionId,
    address: Url,
    events: mpsc::UnboundedSender<TransportEvent>,
    frames: mpsc::UnboundedReceiver<OutboundFrame>,
}

impl MemoryPeer {
    /// Returns the connection id assigned by the endpoint side.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns the address the endpoint connected to.
    #[inline]
    #[must_use]
    pub fn address(&self) -> &Url {
        &self.address
    }

    /// Accepts the connection.
    pub fn open(&self) {
        let _ = self.events.send(TransportEvent::Opened);
    }

    /// Delivers a text frame to the endpoint.
    pub fn send_text(&self, text: impl Into<String>) {
        let _ = self.events.send(TransportEvent::Message(text.into()));
    }

    /// Closes the connection with the given code.
    pub fn close(&self, code: CloseCode) {
        let _ = self.events.send(TransportEvent::Closed(code));
    }

    /// Fails the connection: an error followed by an abnormal close.
    pub fn fail(&self, message: impl Into<String>) {
        let _ = self.events.send(TransportEvent::Errored(message.into()));
        let _ = self.events.send(TransportEvent::Closed(CloseCode::ABNORMAL));
    }

    /// Receives the next frame the endpoint wrote.
    ///
    /// Returns `None` once the endpoint has abandoned the connection.
    pub async fn recv(&mut self) -> Option<OutboundFrame> {
        self.frames.recv().await
    }

    /// Receives the next text frame, skipping pings.
    pub async fn recv_text(&mut self) -> Option<String> {
        loop {
            match self.frames.recv().await? {
                OutboundFrame::Text(text) => return Some(text),
                OutboundFrame::Ping => continue,
                OutboundFrame::Close => return None,
            }
        }
    }

    /// Returns a written frame without waiting.
    pub fn try_recv(&mut self) -> Option<OutboundFrame> {
        self.frames.try_recv().ok()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_hands_peer_to_server() {
        let (transport, mut server) = MemoryTransport::new();
        let url = Url::parse("ws://memory/ws?group=test").expect("url");

        let mut handle = transport.open(&url);
        let peer = server.accept().await.expect("peer");

        assert_eq!(peer.id(), handle.id());
        assert_eq!(peer.address().query(), Some("group=test"));
        assert_eq!(server.connect_count(), 1);

        peer.open();
        peer.send_text("frame");
        assert_eq!(handle.events.recv().await, Some(TransportEvent::Opened));
        assert_eq!(
            handle.events.recv().await,
            Some(TransportEvent::Message("frame".into()))
        );
    }

    #[tokio::test]
    async fn test_peer_reads_link_frames() {
        let (transport, mut server) = MemoryTransport::new();
        let url = Url::parse("ws://memory/ws").expect("url");

        let handle = transport.open(&url);
        let mut peer = server.accept().await.expect("peer");

        handle.link.mark_open();
        handle.link.ping().expect("ping");
        handle.link.send_text("response".into()).expect("send");

        assert_eq!(peer.recv_text().await, Some("response".into()));
    }

    #[tokio::test]
    async fn test_fail_emits_error_then_abnormal_close() {
        let (transport, mut server) = MemoryTransport::new();
        let url = Url::parse("ws://memory/ws").expect("url");

        let mut handle = transport.open(&url);
        server.accept().await.expect("peer").fail("reset");

        assert_eq!(
            handle.events.recv().await,
            Some(TransportEvent::Errored("reset".into()))
        );
        assert_eq!(
            handle.events.recv().await,
            Some(TransportEvent::Closed(CloseCode::ABNORMAL))
        );
    }
}
