//! Outbound side of a single connection.
//!
//! A [`Link`] is the only way to put frames on the wire. Each connection
//! gets its own link; responses hold a clone of the link of the connection
//! that delivered their request, so they can never leak onto a newer one.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tracing::trace;

use crate::error::{Error, Result};
use crate::identifiers::ConnectionId;
use crate::protocol::ResponseEnvelope;

// ============================================================================
// OutboundFrame
// ============================================================================

/// A frame queued for the transport writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// UTF-8 text frame.
    Text(String),
    /// Keepalive ping.
    Ping,
    /// Close the connection with a normal closing handshake.
    Close,
}

// ============================================================================
// Link
// ============================================================================

/// Cloneable sender bound to one connection instance.
#[derive(Clone)]
pub struct Link {
    /// Connection this link belongs to.
    id: ConnectionId,
    /// Frame queue drained by the transport writer.
    frames: mpsc::UnboundedSender<OutboundFrame>,
    /// Set while the connection is open.
    open: Arc<AtomicBool>,
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("id", &self.id)
            .field("open", &self.is_open())
            .finish()
    }
}

impl Link {
    /// Creates a closed link over a frame queue.
    #[must_use]
    pub fn new(id: ConnectionId, frames: mpsc::UnboundedSender<OutboundFrame>) -> Self {
        Self {
            id,
            frames,
            open: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns the connection id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns `true` while the connection is open.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire) && !self.frames.is_closed()
    }

    /// Marks the connection as open.
    pub(crate) fn mark_open(&self) {
        self.open.store(true, Ordering::Release);
    }

    /// Marks the connection as closed; later sends fail.
    pub(crate) fn mark_closed(&self) {
        self.open.store(false, Ordering::Release);
    }

    /// Queues a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the connection is not open.
    pub fn send_text(&self, text: String) -> Result<()> {
        self.send(OutboundFrame::Text(text))
    }

    /// Encodes and queues a response envelope.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the envelope cannot be encoded
    /// - [`Error::ConnectionClosed`] if the connection is not open
    pub fn send_response(&self, response: &ResponseEnvelope) -> Result<()> {
        let json = response.encode()?;
        self.send_text(json)?;
        trace!(connection = %self.id, callback_id = %response.callback_id, "Response queued");
        Ok(())
    }

    /// Queues a keepalive ping.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the connection is not open.
    pub fn ping(&self) -> Result<()> {
        self.send(OutboundFrame::Ping)
    }

    /// Requests a normal close. Idempotent.
    pub(crate) fn close(&self) {
        self.mark_closed();
        let _ = self.frames.send(OutboundFrame::Close);
    }

    fn send(&self, frame: OutboundFrame) -> Result<()> {
        if !self.is_open() {
            return Err(Error::ConnectionClosed);
        }
        self.frames
            .send(frame)
            .map_err(|_| Error::ConnectionClosed)
    }
}

// ============================================================================
// Tests
// ============================================================================
