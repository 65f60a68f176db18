//! Endpoint: connection supervision and lifetime.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Endpoint`] | Handle to a running or stopped endpoint |
//! | [`EndpointBuilder`] | Fluent configuration builder |
//! | [`ReconnectPolicy`] | Attempt cap, delay, backoff and heartbeat |
//! | [`ConnectionState`] | Lifecycle state observed through [`EndpointStatus`] |
//! | [`Lifecycle`] | Pure state machine driven by the supervisor |
//!
//! # Example
//!
//! ```no_run
//! use ws_rpc_endpoint::{ConnectionState, Endpoint, Result};
//!
//! # async fn example() -> Result<()> {
//! let endpoint = Endpoint::builder()
//!     .address("ws://localhost:10087/ws")
//!     .build()?;
//!
//! endpoint.start();
//! endpoint.wait_until(ConnectionState::Connected).await?;
//! endpoint.stop();
//! endpoint.join().await
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for endpoint configuration.
pub mod builder;

/// Endpoint handle and shared state.
pub mod core;

/// Connection lifecycle state machine.
pub mod lifecycle;

/// Reconnect and keepalive settings.
pub mod options;

mod heartbeat;
mod supervisor;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::builder::{EndpointBuilder, GROUP_QUERY_KEY};
pub use self::core::{Endpoint, EndpointStatus};
pub use self::lifecycle::{ConnectionState, Directive, Lifecycle};
pub use self::options::{
    Backoff, DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_MAX_ATTEMPTS, DEFAULT_RECONNECT_DELAY,
    ReconnectPolicy,
};
