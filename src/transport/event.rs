//! Transport events.
//!
//! Every transport surfaces the same four events to the supervisor,
//! regardless of the stream primitive underneath.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// CloseCode
// ============================================================================

/// WebSocket close status code (RFC 6455 §7.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CloseCode(pub u16);

impl CloseCode {
    /// Normal closure.
    pub const NORMAL: Self = Self(1000);

    /// Endpoint going away.
    pub const GOING_AWAY: Self = Self(1001);

    /// Close frame carried no status code.
    pub const NO_STATUS: Self = Self(1005);

    /// Connection dropped without a closing handshake.
    pub const ABNORMAL: Self = Self(1006);

    /// Returns `true` if the connection ended without a closing handshake.
    #[inline]
    #[must_use]
    pub const fn is_abnormal(self) -> bool {
        self.0 == Self::ABNORMAL.0
    }
}

impl fmt::Display for CloseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// TransportEvent
// ============================================================================

/// An event raised by one transport connection.
///
/// A connection raises at most one [`TransportEvent::Opened`]; the stream
/// ends with [`TransportEvent::Closed`], optionally preceded by
/// [`TransportEvent::Errored`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The connection is established and can carry frames.
    Opened,
    /// A text frame arrived.
    Message(String),
    /// The connection ended.
    Closed(CloseCode),
    /// The connection failed.
    Errored(String),
}

// ============================================================================
// Tests
// ============================================================================
