//! Message-stream transport layer.
//!
//! A transport opens connections to the server address and reports what
//! happens on each one as a stream of [`TransportEvent`]s. Outbound frames
//! go through a per-connection [`Link`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                              ┌─────────────────┐
//! │  Supervisor      │   TransportEvent stream      │                 │
//! │                  │◄─────────────────────────────│  Transport      │
//! │  Dispatcher ─────┼──► Link (OutboundFrame) ────►│  task           │◄──► Server
//! └──────────────────┘                              └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `event` | Transport events and close codes |
//! | `link` | Per-connection outbound sender |
//! | `memory` | In-process transport for tests and embedding |
//! | `websocket` | WebSocket transport over `tokio-tungstenite` |

// ============================================================================
// Imports
// ============================================================================

use tokio::sync::mpsc;
use url::Url;

use crate::identifiers::ConnectionId;

// ============================================================================
// Submodules
// ============================================================================

/// Transport events and close codes.
pub mod event;

/// Per-connection outbound sender.
pub mod link;

/// In-process transport.
pub mod memory;

/// WebSocket transport.
pub mod websocket;

// ============================================================================
// Re-exports
// ============================================================================

pub use event::{CloseCode, TransportEvent};
pub use link::{Link, OutboundFrame};
pub use memory::{MemoryPeer, MemoryServer, MemoryTransport};
pub use websocket::WebSocketTransport;

// ============================================================================
// Transport
// ============================================================================

/// Opens connections to a server address.
///
/// `open` must return immediately; connection progress is reported through
/// the handle's event stream. A failed connect is reported as
/// [`TransportEvent::Errored`] and/or [`TransportEvent::Closed`], never as
/// a panic or a blocked call.
pub trait Transport: Send + Sync + 'static {
    /// Starts a new connection attempt.
    fn open(&self, address: &Url) -> TransportHandle;
}

// ============================================================================
// TransportHandle
// ============================================================================

/// Both halves of one connection attempt.
///
/// Dropping the handle abandons the connection: the transport stops
/// reporting events and closes the stream.
#[derive(Debug)]
pub struct TransportHandle {
    /// Outbound sender for this connection.
    pub link: Link,
    /// Events raised by this connection.
    pub events: mpsc::UnboundedReceiver<TransportEvent>,
}

impl TransportHandle {
    /// Creates a handle and the transport-side channel ends.
    ///
    /// The returned sender feeds [`TransportHandle::events`]; the returned
    /// receiver drains frames queued through [`TransportHandle::link`].
    #[must_use]
    pub fn channel() -> (
        Self,
        mpsc::UnboundedSender<TransportEvent>,
        mpsc::UnboundedReceiver<OutboundFrame>,
    ) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let handle = Self {
            link: Link::new(ConnectionId::next(), frames_tx),
            events: events_rx,
        };
        (handle, events_tx, frames_rx)
    }

    /// Returns the connection id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.link.id()
    }
}
