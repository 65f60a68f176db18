//! WS RPC Endpoint - Persistent WebSocket RPC endpoint.
//!
//! This library keeps a long-lived WebSocket connection to a server and
//! lets that server call procedures registered by the embedding
//! application.
//!
//! # Architecture
//!
//! The endpoint is the callee in a reversed RPC model:
//!
//! - **Server**: Sends request envelopes naming a procedure
//! - **Endpoint (Rust)**: Runs the procedure, answers with a response envelope
//!
//! Key design principles:
//!
//! - One supervisor task owns the connection, the reconnect timer and the
//!   heartbeat
//! - Every response travels on the connection that delivered its request;
//!   a response produced after that connection closed is dropped
//! - Procedures answer through a single-use [`Completion`], possibly from
//!   another task and in any order
//! - Failures are handled where they occur; only the reconnect cap ends
//!   the endpoint
//!
//! # Quick Start
//!
//! ```no_run
//! use serde_json::json;
//! use ws_rpc_endpoint::{Endpoint, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let endpoint = Endpoint::builder()
//!         .address("ws://localhost:10087/ws")
//!         .group("test")
//!         .build()?;
//!
//!     endpoint.register_fn("add", |params| {
//!         Ok(json!(params.i64(0)? + params.i64(1)?))
//!     });
//!
//!     // Serves until stopped or the reconnect cap is reached
//!     endpoint.start().join().await
//! }
//! ```
//!
//! # Wire Format
//!
//! ```text
//! Request:  { "id": "r1", "action": "add", "params": [2, 3] }
//! Response: { "callbackId": "r1", "status": 200, "result": 5 }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`dispatch`] | Request routing: [`Dispatcher`] |
//! | [`endpoint`] | [`Endpoint`], builder, reconnect policy, lifecycle |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`procedure`] | [`ProcedureRegistry`], [`Completion`], [`Params`] |
//! | [`protocol`] | Request/response envelopes |
//! | [`transport`] | Connection abstraction and WebSocket implementation |

// ============================================================================
// Modules
// ============================================================================

/// Request routing.
///
/// Decodes request envelopes and invokes the named procedure.
pub mod dispatch;

/// Endpoint lifetime and connection supervision.
///
/// Use [`Endpoint::builder()`] to create a configured endpoint.
pub mod endpoint;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for requests and connections.
pub mod identifiers;

/// Procedures and their registry.
///
/// - [`ProcedureRegistry`] - Ordered name to procedure table
/// - [`Completion`] - Single-use response handle
/// - [`Params`] - Positional arguments
pub mod procedure;

/// WebSocket protocol message types.
///
/// Request and response envelope structures.
pub mod protocol;

/// Transport layer.
///
/// Connection abstraction with WebSocket and in-memory implementations.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Dispatch types
pub use dispatch::{DispatchOutcome, Dispatcher};

// Endpoint types
pub use endpoint::{
    Backoff, ConnectionState, Endpoint, EndpointBuilder, EndpointStatus, ReconnectPolicy,
};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ConnectionId, CorrelationId};

// Procedure types
pub use procedure::{
    AsyncProcedure, Completion, FnProcedure, Params, Procedure, ProcedureError, ProcedureRegistry,
    ProcedureResult, REGISTERED_METHODS,
};

// Protocol types
pub use protocol::{RequestEnvelope, ResponseEnvelope, Status};

// Transport types
pub use transport::{CloseCode, Link, Transport, TransportEvent, WebSocketTransport};
