//! Builder pattern for endpoint configuration.
//!
//! Provides a fluent API for configuring and creating [`Endpoint`] instances.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use ws_rpc_endpoint::Endpoint;
//!
//! # fn example() -> ws_rpc_endpoint::Result<()> {
//! let endpoint = Endpoint::builder()
//!     .address("ws://localhost:10087/ws")
//!     .group("test")
//!     .max_attempts(10)
//!     .reconnect_delay(Duration::from_secs(3))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::dispatch::{DEFAULT_MAX_MESSAGE_SIZE, Dispatcher};
use crate::error::{Error, Result};
use crate::procedure::ProcedureRegistry;
use crate::transport::{Transport, WebSocketTransport};

use super::core::{Endpoint, ExhaustedHook};
use super::options::ReconnectPolicy;

// ============================================================================
// Constants
// ============================================================================

/// Query key the server uses to route endpoints into groups.
pub const GROUP_QUERY_KEY: &str = "group";

// ============================================================================
// EndpointBuilder
// ============================================================================

/// Builder for configuring an [`Endpoint`] instance.
///
/// Use [`Endpoint::builder()`] to create a new builder.
#[derive(Clone)]
pub struct EndpointBuilder {
    /// Server address as given.
    address: Option<String>,
    /// Query parameters appended to the address.
    query: Vec<(String, String)>,
    /// Reconnect and heartbeat settings.
    policy: ReconnectPolicy,
    /// Inbound frame size limit in bytes.
    max_message_size: usize,
    /// Connection factory; WebSocket when unset.
    transport: Option<Arc<dyn Transport>>,
    /// Pre-populated registry.
    registry: Option<ProcedureRegistry>,
    /// Exhaustion callback.
    on_exhausted: Option<ExhaustedHook>,
}

impl Default for EndpointBuilder {
    fn default() -> Self {
        Self {
            address: None,
            query: Vec::new(),
            policy: ReconnectPolicy::default(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            transport: None,
            registry: None,
            on_exhausted: None,
        }
    }
}

impl fmt::Debug for EndpointBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointBuilder")
            .field("address", &self.address)
            .field("query", &self.query)
            .field("policy", &self.policy)
            .field("max_message_size", &self.max_message_size)
            .field("custom_transport", &self.transport.is_some())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// EndpointBuilder Implementation
// ============================================================================

impl EndpointBuilder {
    /// Creates a new builder with default settings and no address.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server address.
    ///
    /// # Arguments
    ///
    /// * `address` - WebSocket URL (e.g., "ws://localhost:10087/ws")
    #[inline]
    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Appends a query parameter to the address.
    #[inline]
    #[must_use]
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Joins a server-side group (`?group=<name>`).
    #[inline]
    #[must_use]
    pub fn group(self, name: impl Into<String>) -> Self {
        self.query_param(GROUP_QUERY_KEY, name)
    }

    /// Replaces the whole reconnect policy.
    #[inline]
    #[must_use]
    pub fn policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the reconnect attempt cap.
    #[inline]
    #[must_use]
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.policy = self.policy.with_max_attempts(max_attempts);
        self
    }

    /// Sets the delay before each reconnect attempt.
    #[inline]
    #[must_use]
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.policy = self.policy.with_delay(delay);
        self
    }

    /// Sets the keepalive interval.
    #[inline]
    #[must_use]
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.policy = self.policy.with_heartbeat(interval);
        self
    }

    /// Disables keepalive pings.
    #[inline]
    #[must_use]
    pub fn without_heartbeat(mut self) -> Self {
        self.policy = self.policy.without_heartbeat();
        self
    }

    /// Sets the inbound frame size limit in bytes.
    #[inline]
    #[must_use]
    pub fn max_message_size(mut self, bytes: usize) -> Self {
        self.max_message_size = bytes;
        self
    }

    /// Uses a custom transport instead of WebSocket.
    #[inline]
    #[must_use]
    pub fn transport(mut self, transport: impl Transport) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Uses an existing registry, shared with its other clones.
    #[inline]
    #[must_use]
    pub fn registry(mut self, registry: ProcedureRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets a callback run when the reconnect cap is reached.
    ///
    /// Receives the number of reconnect attempts made.
    #[inline]
    #[must_use]
    pub fn on_exhausted(mut self, hook: impl Fn(u32) + Send + Sync + 'static) -> Self {
        self.on_exhausted = Some(Arc::new(hook));
        self
    }

    /// Builds the endpoint with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if no address is set or the policy is invalid
    /// - [`Error::InvalidAddress`] if the address is not a `ws`/`wss` URL
    pub fn build(self) -> Result<Endpoint> {
        let address = self.validate_address()?;
        self.policy.validate()?;

        if self.max_message_size == 0 {
            return Err(Error::config("max_message_size must be greater than zero"));
        }

        let registry = self.registry.unwrap_or_default();
        let dispatcher =
            Dispatcher::new(registry).with_max_message_size(self.max_message_size);
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(WebSocketTransport::new()));

        Ok(Endpoint::from_parts(
            address,
            self.policy,
            transport,
            dispatcher,
            self.on_exhausted,
        ))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl EndpointBuilder {
    /// Parses the address and appends the query parameters.
    fn validate_address(&self) -> Result<Url> {
        let raw = self.address.as_deref().ok_or_else(|| {
            Error::config(
                "Server address is required. Use .address() to set it.\n\
                 Example: Endpoint::builder().address(\"ws://localhost:10087/ws\")",
            )
        })?;

        let mut url =
            Url::parse(raw).map_err(|e| Error::invalid_address(raw, e.to_string()))?;

        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(Error::invalid_address(raw, "scheme must be ws or wss"));
        }

        if url.host_str().is_none_or(str::is_empty) {
            return Err(Error::invalid_address(raw, "missing host"));
        }

        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }
}

// ============================================================================
// Tests
// ============================================================================
