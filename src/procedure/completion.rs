//! Single-use completion handle.
//!
//! A [`Completion`] is handed to every procedure together with its
//! arguments. Calling [`Completion::resolve`] sends the 200 response for
//! the originating request; the handle is consumed, so a procedure cannot
//! answer the same request twice. Handles are `Send + 'static` and may be
//! moved into spawned tasks and resolved long after the procedure returned.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Error;
use crate::identifiers::{ConnectionId, CorrelationId};
use crate::protocol::ResponseEnvelope;
use crate::transport::Link;

// ============================================================================
// Completion
// ============================================================================

/// Answers exactly one request on the connection that delivered it.
pub struct Completion {
    /// Request id to echo as `callbackId`.
    id: CorrelationId,
    /// Connection the request arrived on.
    link: Link,
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("id", &self.id)
            .field("connection", &self.link.id())
            .finish()
    }
}

impl Completion {
    /// Creates a handle for one request.
    pub(crate) fn new(id: CorrelationId, link: Link) -> Self {
        Self { id, link }
    }

    /// Returns the request id this handle answers.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &CorrelationId {
        &self.id
    }

    /// Returns the connection the request arrived on.
    #[inline]
    #[must_use]
    pub fn connection(&self) -> ConnectionId {
        self.link.id()
    }

    /// Returns `true` while the originating connection is still open.
    ///
    /// Long-running procedures may check this to skip work whose response
    /// would be dropped anyway.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.link.is_open()
    }

    /// Sends a 200 response carrying `result`.
    ///
    /// Dropped with a warning if the originating connection has closed.
    pub fn resolve(self, result: impl Into<Value>) {
        deliver(&self.link, &ResponseEnvelope::ok(self.id, result.into()));
    }

    /// Sends a 500 response carrying `message`.
    ///
    /// For failures discovered after the procedure returned, e.g. inside a
    /// spawned task.
    pub fn fail(self, message: impl Into<String>) {
        deliver(&self.link, &ResponseEnvelope::failed(self.id, message));
    }
}

// ============================================================================
// Delivery
// ============================================================================

/// Sends a response, logging and dropping it on failure.
pub(crate) fn deliver(link: &Link, response: &ResponseEnvelope) {
    match link.send_response(response) {
        Ok(()) => {
            debug!(
                connection = %link.id(),
                callback_id = %response.callback_id,
                status = %response.status,
                "Response sent"
            );
        }
        Err(Error::ConnectionClosed) => {
            warn!(
                connection = %link.id(),
                callback_id = %response.callback_id,
                "Connection not open, dropping response"
            );
        }
        Err(e) => {
            warn!(
                connection = %link.id(),
                callback_id = %response.callback_id,
                error = %e,
                "Failed to send response"
            );
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
