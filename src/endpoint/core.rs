//! Endpoint handle and shared state.
//!
//! The [`Endpoint`] owns one supervisor task. Cloning the handle is cheap;
//! every clone observes and controls the same connection.
//!
//! # Example
//!
//! ```no_run
//! use ws_rpc_endpoint::{Endpoint, Result};
//!
//! # async fn example() -> Result<()> {
//! let endpoint = Endpoint::builder()
//!     .address("ws://localhost:10087/ws")
//!     .group("test")
//!     .build()?;
//!
//! endpoint.register_fn("ping", |_params| Ok("pong".into()));
//! endpoint.start().join().await
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};
use url::Url;

use crate::dispatch::Dispatcher;
use crate::error::{Error, Result};
use crate::identifiers::ConnectionId;
use crate::procedure::{Params, Procedure, ProcedureError, ProcedureRegistry};
use crate::transport::Transport;

use super::builder::EndpointBuilder;
use super::lifecycle::ConnectionState;
use super::options::ReconnectPolicy;
use super::supervisor::Supervisor;

// ============================================================================
// Types
// ============================================================================

/// Callback invoked once with the number of reconnect attempts made when
/// the endpoint gives up.
pub(crate) type ExhaustedHook = Arc<dyn Fn(u32) + Send + Sync>;

/// Snapshot of the supervisor's view of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointStatus {
    /// Lifecycle state.
    pub state: ConnectionState,
    /// Consecutive failed connections since the last open or message.
    pub attempts: u32,
    /// Connection being opened or served, if any.
    pub connection: Option<ConnectionId>,
}

impl EndpointStatus {
    const fn initial() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            attempts: 0,
            connection: None,
        }
    }
}

/// Internal shared state for the endpoint.
pub(crate) struct EndpointInner {
    /// Validated server address.
    pub address: Url,

    /// Reconnect and heartbeat settings.
    pub policy: ReconnectPolicy,

    /// Opens connections to `address`.
    pub transport: Arc<dyn Transport>,

    /// Routes inbound requests to the registry.
    pub dispatcher: Dispatcher,

    /// Cancelled by [`Endpoint::stop`].
    pub shutdown: CancellationToken,

    /// Latest supervisor status.
    pub status: watch::Sender<EndpointStatus>,

    /// Exhaustion callback.
    pub on_exhausted: Option<ExhaustedHook>,

    /// Set once the supervisor has been launched or the endpoint stopped.
    started: AtomicBool,

    /// Supervisor task spawned by [`Endpoint::start`].
    task: Mutex<Option<JoinHandle<Result<()>>>>,
}

// ============================================================================
// Endpoint
// ============================================================================

/// Persistent RPC endpoint.
///
/// Maintains one connection to the server, serves calls to the procedures
/// in its [`ProcedureRegistry`] and reconnects after failures according to
/// its [`ReconnectPolicy`].
#[derive(Clone)]
pub struct Endpoint {
    /// Shared inner state.
    pub(crate) inner: Arc<EndpointInner>,
}

// ============================================================================
// Endpoint - Display
// ============================================================================

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("address", &self.inner.address.as_str())
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Endpoint - Construction
// ============================================================================

impl Endpoint {
    /// Creates a configuration builder for the endpoint.
    #[inline]
    #[must_use]
    pub fn builder() -> EndpointBuilder {
        EndpointBuilder::new()
    }

    /// Assembles an endpoint from validated parts.
    pub(crate) fn from_parts(
        address: Url,
        policy: ReconnectPolicy,
        transport: Arc<dyn Transport>,
        dispatcher: Dispatcher,
        on_exhausted: Option<ExhaustedHook>,
    ) -> Self {
        let (status, _) = watch::channel(EndpointStatus::initial());

        Self {
            inner: Arc::new(EndpointInner {
                address,
                policy,
                transport,
                dispatcher,
                shutdown: CancellationToken::new(),
                status,
                on_exhausted,
                started: AtomicBool::new(false),
                task: Mutex::new(None),
            }),
        }
    }
}

// ============================================================================
// Endpoint - Registration
// ============================================================================

impl Endpoint {
    /// Returns the procedure registry.
    ///
    /// Registration is allowed in every state; a procedure added while
    /// connected serves the next request that names it.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &ProcedureRegistry {
        self.inner.dispatcher.registry()
    }

    /// Registers a procedure, replacing any procedure with the same name.
    pub fn register(&self, name: impl Into<String>, procedure: impl Procedure) -> &Self {
        self.registry().register(name, procedure);
        self
    }

    /// Registers a function that returns its result immediately.
    pub fn register_fn<F>(&self, name: impl Into<String>, function: F) -> &Self
    where
        F: Fn(Params) -> std::result::Result<Value, ProcedureError> + Send + Sync + 'static,
    {
        self.registry().register_fn(name, function);
        self
    }

    /// Registers an async function; each call runs on its own task.
    pub fn register_async<F, Fut>(&self, name: impl Into<String>, function: F) -> &Self
    where
        F: Fn(Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<Value, ProcedureError>> + Send + 'static,
    {
        self.registry().register_async(name, function);
        self
    }
}

// ============================================================================
// Endpoint - Lifetime
// ============================================================================

impl Endpoint {
    /// Spawns the supervisor task.
    ///
    /// Calling `start` again, or after [`stop`](Self::stop), does nothing.
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> &Self {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            debug!(address = %self.inner.address, "Endpoint already started");
            return self;
        }

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move { Supervisor::new(&inner).run().await });
        *self.inner.task.lock() = Some(task);
        self
    }

    /// Runs the supervisor on the current task until the endpoint stops or
    /// gives up.
    ///
    /// # Errors
    ///
    /// - [`Error::ReconnectExhausted`] if the reconnect cap was reached
    /// - [`Error::Config`] if the endpoint was already started
    pub async fn run(&self) -> Result<()> {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return Err(Error::config("Endpoint already started"));
        }
        Supervisor::new(&self.inner).run().await
    }

    /// Stops the endpoint.
    ///
    /// Closes the live connection, cancels any pending reconnect and moves
    /// to [`ConnectionState::Stopped`]. In-flight procedures keep running;
    /// their responses are dropped.
    pub fn stop(&self) {
        self.inner.shutdown.cancel();

        // Never started: nothing will publish the terminal state
        if !self.inner.started.swap(true, Ordering::SeqCst) {
            self.inner.status.send_modify(|status| {
                status.state = ConnectionState::Stopped;
            });
        }
    }

    /// Waits until the endpoint reaches a terminal state.
    ///
    /// # Errors
    ///
    /// - [`Error::ReconnectExhausted`] if the reconnect cap was reached
    /// - [`Error::Stopped`] if the supervisor task panicked
    pub async fn join(&self) -> Result<()> {
        let task = self.inner.task.lock().take();

        if let Some(task) = task {
            return match task.await {
                Ok(result) => result,
                Err(e) => {
                    error!(error = %e, "Supervisor task failed");
                    Err(Error::Stopped)
                }
            };
        }

        let status = self.wait_for(ConnectionState::is_terminal).await?;
        match status.state {
            ConnectionState::Exhausted => {
                Err(Error::reconnect_exhausted(status.attempts.saturating_sub(1)))
            }
            _ => Ok(()),
        }
    }
}

// ============================================================================
// Endpoint - Observation
// ============================================================================

impl Endpoint {
    /// Returns the server address, query parameters included.
    #[inline]
    #[must_use]
    pub fn address(&self) -> &Url {
        &self.inner.address
    }

    /// Returns the reconnect policy.
    #[inline]
    #[must_use]
    pub fn policy(&self) -> &ReconnectPolicy {
        &self.inner.policy
    }

    /// Returns the current status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> EndpointStatus {
        *self.inner.status.borrow()
    }

    /// Returns the current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.status.borrow().state
    }

    /// Returns the current attempt counter.
    #[inline]
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.inner.status.borrow().attempts
    }

    /// Subscribes to status changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<EndpointStatus> {
        self.inner.status.subscribe()
    }

    /// Waits until the endpoint is in `state`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Stopped`] or [`Error::ReconnectExhausted`] if the
    /// endpoint reaches a different terminal state first.
    pub async fn wait_until(&self, state: ConnectionState) -> Result<()> {
        let status = self
            .wait_for(|current| current == state || current.is_terminal())
            .await?;

        match status.state {
            current if current == state => Ok(()),
            ConnectionState::Exhausted => {
                Err(Error::reconnect_exhausted(status.attempts.saturating_sub(1)))
            }
            _ => Err(Error::Stopped),
        }
    }

    async fn wait_for(&self, done: impl Fn(ConnectionState) -> bool) -> Result<EndpointStatus> {
        let mut rx = self.subscribe();
        let status = rx
            .wait_for(|status| done(status.state))
            .await
            .map_err(|_| Error::Stopped)?;
        Ok(*status)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    use serde_json::json;

    use crate::procedure::{Completion, ProcedureResult};
    use crate::protocol::{ResponseEnvelope, Status};
    use crate::transport::{CloseCode, MemoryPeer, MemoryServer, MemoryTransport, OutboundFrame};

    fn endpoint(policy: ReconnectPolicy) -> (Endpoint, MemoryServer) {
        let (transport, server) = MemoryTransport::new();
        let endpoint = Endpoint::builder()
            .address("ws://memory/ws")
            .policy(policy)
            .transport(transport)
            .build()
            .expect("build");
        (endpoint, server)
    }

    fn fast_policy() -> ReconnectPolicy {
        ReconnectPolicy::new()
            .with_delay(Duration::from_millis(100))
            .without_heartbeat()
    }

    async fn accept(server: &mut MemoryServer) -> MemoryPeer {
        server.accept().await.expect("connection attempt")
    }

    async fn response(peer: &mut MemoryPeer) -> ResponseEnvelope {
        let text = peer.recv_text().await.expect("response frame");
        ResponseEnvelope::decode(&text).expect("decode response")
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_state_is_disconnected() {
        let (endpoint, server) = endpoint(fast_policy());
        assert_eq!(endpoint.state(), ConnectionState::Disconnected);
        assert_eq!(endpoint.attempts(), 0);
        assert_eq!(server.connect_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_moves_to_connected() {
        let (endpoint, mut server) = endpoint(fast_policy());
        endpoint.start();

        let peer = accept(&mut server).await;
        assert_eq!(endpoint.status().connection, Some(peer.id()));
        assert_eq!(endpoint.state(), ConnectionState::Connecting);

        peer.open();
        endpoint
            .wait_until(ConnectionState::Connected)
            .await
            .expect("connected");
        assert_eq!(endpoint.attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_serves_requests_over_connection() {
        let (endpoint, mut server) = endpoint(fast_policy());
        endpoint.register_fn("add", |params| {
            Ok(json!(params.i64(0)? + params.i64(1)?))
        });
        endpoint.start();

        let mut peer = accept(&mut server).await;
        peer.open();
        peer.send_text(r#"{"id":"a1","action":"add","params":[2,3]}"#);

        let resp = response(&mut peer).await;
        assert_eq!(resp.callback_id.as_str(), "a1");
        assert_eq!(resp.status, Status::Ok);
        assert_eq!(resp.result, json!(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_eleven_closes_give_ten_reconnects_then_exhausted() {
        let exhausted = Arc::new(AtomicU32::new(0));
        let hook_seen = Arc::clone(&exhausted);

        let (transport, mut server) = MemoryTransport::new();
        let endpoint = Endpoint::builder()
            .address("ws://memory/ws")
            .policy(fast_policy().with_max_attempts(10))
            .transport(transport)
            .on_exhausted(move |attempts| hook_seen.store(attempts, Ordering::SeqCst))
            .build()
            .expect("build");
        endpoint.start();

        for _ in 0..11 {
            let peer = accept(&mut server).await;
            peer.close(CloseCode::ABNORMAL);
        }

        let err = endpoint.join().await.expect_err("exhausted");
        assert!(matches!(err, Error::ReconnectExhausted { attempts: 10 }));
        assert_eq!(endpoint.state(), ConnectionState::Exhausted);
        assert_eq!(server.connect_count(), 11);
        assert_eq!(exhausted.load(Ordering::SeqCst), 10);

        // No further attempt is ever scheduled
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(server.try_accept().is_none());
        assert_eq!(server.connect_count(), 11);
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_open_resets_attempts() {
        let (endpoint, mut server) = endpoint(fast_policy().with_max_attempts(2));
        endpoint.start();

        for _ in 0..2 {
            accept(&mut server).await.close(CloseCode::ABNORMAL);
        }

        let peer = accept(&mut server).await;
        assert_eq!(endpoint.attempts(), 2);

        peer.open();
        endpoint
            .wait_until(ConnectionState::Connected)
            .await
            .expect("connected");
        assert_eq!(endpoint.attempts(), 0);

        // Cap counts again from zero
        peer.close(CloseCode::NORMAL);
        for _ in 0..2 {
            accept(&mut server).await.close(CloseCode::ABNORMAL);
        }
        let err = endpoint.join().await.expect_err("exhausted");
        assert!(matches!(err, Error::ReconnectExhausted { attempts: 2 }));
        assert_eq!(server.connect_count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_message_resets_attempts() {
        let (endpoint, mut server) = endpoint(fast_policy());
        endpoint.start();

        accept(&mut server).await.close(CloseCode::ABNORMAL);
        let peer = accept(&mut server).await;
        assert_eq!(endpoint.attempts(), 1);

        // Traffic on a connection that never reported open
        peer.send_text("not json");
        let mut rx = endpoint.subscribe();
        rx.wait_for(|status| status.attempts == 0)
            .await
            .expect("reset");
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_waits_for_delay() {
        let (endpoint, mut server) = endpoint(fast_policy().with_delay(Duration::from_secs(3)));
        endpoint.start();

        accept(&mut server).await.close(CloseCode::NORMAL);
        endpoint
            .wait_until(ConnectionState::Backoff)
            .await
            .expect("backoff");

        tokio::time::sleep(Duration::from_millis(2900)).await;
        assert_eq!(server.connect_count(), 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(server.try_accept().is_some());
        assert_eq!(server.connect_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_errored_connection_reconnects() {
        let (endpoint, mut server) = endpoint(fast_policy());
        endpoint.start();

        let peer = accept(&mut server).await;
        peer.open();
        peer.fail("connection reset");

        let next = accept(&mut server).await;
        assert_ne!(next.id(), peer.id());
        assert_eq!(endpoint.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_response_after_close_is_dropped() {
        let (endpoint, mut server) = endpoint(fast_policy());
        let (tx, rx) = tokio::sync::oneshot::channel();
        let parked = Mutex::new(Some(tx));
        endpoint.register("slow", move |done: Completion, _params: Params| -> ProcedureResult {
            if let Some(tx) = parked.lock().take() {
                let _ = tx.send(done);
            }
            Ok(())
        });
        endpoint.start();

        let mut first = accept(&mut server).await;
        first.open();
        first.send_text(r#"{"id":"s1","action":"slow","params":[]}"#);
        let done = rx.await.expect("completion");

        first.close(CloseCode::ABNORMAL);
        let mut second = accept(&mut server).await;
        second.open();
        endpoint
            .wait_until(ConnectionState::Connected)
            .await
            .expect("connected");

        assert!(!done.is_connected());
        done.resolve("late");

        assert!(second.try_recv().is_none());
        assert!(first.try_recv().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_pings_while_connected() {
        let (endpoint, mut server) =
            endpoint(fast_policy().with_heartbeat(Duration::from_secs(25)));
        endpoint.start();

        let mut peer = accept(&mut server).await;
        peer.open();
        endpoint
            .wait_until(ConnectionState::Connected)
            .await
            .expect("connected");

        assert_eq!(peer.recv().await, Some(OutboundFrame::Ping));
        assert_eq!(peer.recv().await, Some(OutboundFrame::Ping));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_heartbeat_before_open() {
        let (endpoint, mut server) =
            endpoint(fast_policy().with_heartbeat(Duration::from_secs(1)));
        endpoint.start();

        let mut peer = accept(&mut server).await;
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(peer.try_recv().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_closes_connection() {
        let (endpoint, mut server) = endpoint(fast_policy());
        endpoint.start();

        let mut peer = accept(&mut server).await;
        peer.open();
        endpoint
            .wait_until(ConnectionState::Connected)
            .await
            .expect("connected");

        endpoint.stop();
        endpoint.join().await.expect("clean stop");
        assert_eq!(endpoint.state(), ConnectionState::Stopped);
        assert_eq!(peer.recv().await, Some(OutboundFrame::Close));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_backoff() {
        let (endpoint, mut server) = endpoint(fast_policy().with_delay(Duration::from_secs(30)));
        endpoint.start();

        accept(&mut server).await.close(CloseCode::ABNORMAL);
        endpoint
            .wait_until(ConnectionState::Backoff)
            .await
            .expect("backoff");

        endpoint.stop();
        endpoint.join().await.expect("clean stop");
        assert_eq!(server.connect_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_before_start() {
        let (endpoint, server) = endpoint(fast_policy());
        endpoint.stop();
        endpoint.start();

        endpoint.join().await.expect("stopped");
        assert_eq!(endpoint.state(), ConnectionState::Stopped);
        assert_eq!(server.connect_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_reports_other_terminal_state() {
        let (endpoint, _server) = endpoint(fast_policy());
        endpoint.stop();

        let err = endpoint
            .wait_until(ConnectionState::Connected)
            .await
            .expect_err("stopped first");
        assert!(matches!(err, Error::Stopped));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_rejects_second_start() {
        let (endpoint, _server) = endpoint(fast_policy());
        endpoint.start();
        assert!(matches!(endpoint.run().await, Err(Error::Config { .. })));
        endpoint.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_idempotent() {
        let (endpoint, mut server) = endpoint(fast_policy());
        endpoint.start();
        endpoint.start();

        let _peer = accept(&mut server).await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(server.connect_count(), 1);
    }
}
