//! Wire protocol message types.
//!
//! This module defines the JSON envelopes exchanged with the server over
//! the WebSocket text channel.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `RequestEnvelope` | Server → Endpoint | Invoke a registered procedure |
//! | `ResponseEnvelope` | Endpoint → Server | Result of one invocation |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `envelope` | Request and response envelopes |
//! | `status` | Response status codes |

// ============================================================================
// Submodules
// ============================================================================

/// Request and response envelopes.
pub mod envelope;

/// Response status codes.
pub mod status;

// ============================================================================
// Re-exports
// ============================================================================

pub use envelope::{RequestEnvelope, ResponseEnvelope};
pub use status::Status;
