//! Type-safe identifiers.
//!
//! Newtype wrappers keep request correlation ids and connection generations
//! from being mixed up with arbitrary strings and counters.
//!
//! | Type | Wraps | Purpose |
//! |------|-------|---------|
//! | [`CorrelationId`] | `String` | Request `id` echoed as `callbackId` |
//! | [`ConnectionId`] | `u64` | Generation of one transport connection |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

// ============================================================================
// CorrelationId
// ============================================================================

/// Identifier chosen by the server for one request.
///
/// Serialized transparently as a JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Wraps a raw id.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CorrelationId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CorrelationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ============================================================================
// ConnectionId
// ============================================================================

/// Process-wide counter for connection generations.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Generation number of a single transport connection.
///
/// Every connect attempt gets a fresh id, so responses and log lines can be
/// tied to the exact connection instance that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocates the next connection id.
    #[inline]
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw generation number.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_id_serializes_as_string() {
        let id = CorrelationId::new("r1");
        assert_eq!(serde_json::to_string(&id).expect("serialize"), "\"r1\"");

        let parsed: CorrelationId = serde_json::from_str("\"abc\"").expect("parse");
        assert_eq!(parsed.as_str(), "abc");
    }

    #[test]
    fn test_correlation_id_rejects_non_string() {
        assert!(serde_json::from_str::<CorrelationId>("42").is_err());
    }

    #[test]
    fn test_connection_ids_are_unique_and_increasing() {
        let a = ConnectionId::next();
        let b = ConnectionId::next();
        assert_ne!(a, b);
        assert!(b > a);
        assert!(a.to_string().starts_with("conn-"));
    }
}
