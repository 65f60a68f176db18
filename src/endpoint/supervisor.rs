//! Connection supervisor.
//!
//! A single task owns the connection: it opens transport connections,
//! feeds their events to the [`Lifecycle`], dispatches inbound requests,
//! drives the heartbeat and sleeps through backoff. All transport events
//! for the endpoint are handled here, one at a time.

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, error, info, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::ConnectionId;
use crate::transport::{CloseCode, TransportEvent, TransportHandle};

use super::core::EndpointInner;
use super::heartbeat::Heartbeat;
use super::lifecycle::{Directive, Lifecycle};

// ============================================================================
// Supervisor
// ============================================================================

/// Runs the endpoint until it is stopped or exhausts its reconnect cap.
pub(crate) struct Supervisor<'a> {
    inner: &'a EndpointInner,
    lifecycle: Lifecycle,
    heartbeat: Heartbeat,
    /// Connection currently being served, if any.
    connection: Option<ConnectionId>,
}

impl<'a> Supervisor<'a> {
    pub(crate) fn new(inner: &'a EndpointInner) -> Self {
        Self {
            inner,
            lifecycle: Lifecycle::new(inner.policy.clone()),
            heartbeat: Heartbeat::new(inner.policy.heartbeat),
            connection: None,
        }
    }

    /// Main loop.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReconnectExhausted`] when the reconnect cap is
    /// reached.
    pub(crate) async fn run(mut self) -> Result<()> {
        let mut directive = if self.inner.shutdown.is_cancelled() {
            self.lifecycle.stop()
        } else {
            self.lifecycle.start()
        };

        loop {
            directive = match directive {
                Directive::Connect => {
                    let handle = self.inner.transport.open(&self.inner.address);
                    info!(
                        connection = %handle.id(),
                        address = %self.inner.address,
                        attempt = self.lifecycle.attempts(),
                        "Connecting"
                    );
                    self.connection = Some(handle.id());
                    self.publish();
                    self.serve(handle).await
                }

                Directive::Wait(delay) => {
                    self.publish();
                    info!(
                        delay_ms = delay.as_millis() as u64,
                        attempt = self.lifecycle.attempts(),
                        "Reconnecting after delay"
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => self.lifecycle.backoff_elapsed(),
                        _ = self.inner.shutdown.cancelled() => self.lifecycle.stop(),
                    }
                }

                Directive::GiveUp => {
                    self.publish();
                    let attempts = self.lifecycle.attempts().saturating_sub(1);
                    error!(
                        attempts,
                        address = %self.inner.address,
                        "Reconnect attempts exhausted, giving up"
                    );
                    if let Some(hook) = &self.inner.on_exhausted {
                        hook(attempts);
                    }
                    return Err(Error::reconnect_exhausted(attempts));
                }

                Directive::Halt => {
                    self.publish();
                    info!("Endpoint stopped");
                    return Ok(());
                }

                Directive::Continue => {
                    debug!(state = %self.lifecycle.state(), "Nothing left to supervise");
                    self.publish();
                    return Ok(());
                }
            };
        }
    }

    /// Serves one connection until it ends; returns the follow-up.
    async fn serve(&mut self, mut handle: TransportHandle) -> Directive {
        let link = handle.link.clone();
        let id = link.id();

        let code = loop {
            tokio::select! {
                event = handle.events.recv() => match event {
                    Some(TransportEvent::Opened) => {
                        link.mark_open();
                        self.lifecycle.opened();
                        self.heartbeat.start();
                        self.publish();
                        info!(connection = %id, "Connection established");
                    }

                    Some(TransportEvent::Message(text)) => {
                        if self.lifecycle.message_received() {
                            self.publish();
                        }
                        trace!(connection = %id, len = text.len(), "Message received");
                        self.inner.dispatcher.dispatch(&text, &link);
                    }

                    Some(TransportEvent::Errored(message)) => {
                        error!(connection = %id, error = %message, "Transport error");
                        break CloseCode::ABNORMAL;
                    }

                    Some(TransportEvent::Closed(code)) => break code,

                    None => {
                        debug!(connection = %id, "Transport event stream ended");
                        break CloseCode::ABNORMAL;
                    }
                },

                _ = self.heartbeat.tick() => {
                    match link.ping() {
                        Ok(()) => trace!(connection = %id, "Heartbeat sent"),
                        Err(e) => debug!(connection = %id, error = %e, "Heartbeat skipped"),
                    }
                }

                _ = self.inner.shutdown.cancelled() => {
                    link.close();
                    self.heartbeat.stop();
                    self.connection = None;
                    return self.lifecycle.stop();
                }
            }
        };

        link.mark_closed();
        self.heartbeat.stop();
        self.connection = None;

        if code.is_abnormal() {
            warn!(
                connection = %id,
                %code,
                attempt = self.lifecycle.attempts() + 1,
                "Connection closed abnormally, possible network or server problem"
            );
        } else {
            info!(
                connection = %id,
                %code,
                attempt = self.lifecycle.attempts() + 1,
                "Connection closed"
            );
        }

        // Late events from this connection are never read
        drop(handle);
        self.lifecycle.closed()
    }

    /// Mirrors lifecycle state into the shared status.
    fn publish(&self) {
        let state = self.lifecycle.state();
        let attempts = self.lifecycle.attempts();
        let connection = self.connection;

        self.inner.status.send_if_modified(|status| {
            let changed = status.state != state
                || status.attempts != attempts
                || status.connection != connection;
            status.state = state;
            status.attempts = attempts;
            status.connection = connection;
            changed
        });
    }
}
