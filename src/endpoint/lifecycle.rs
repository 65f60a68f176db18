//! Connection lifecycle state machine.
//!
//! Pure bookkeeping: no I/O, no timers. The supervisor feeds it transport
//! events and executes the [`Directive`] it returns.
//!
//! ```text
//! Disconnected ──start──► Connecting ──opened──► Connected
//!                            ▲  │                   │
//!                 delay      │  └──closed──┐        │ closed / errored
//!                 elapsed    │             ▼        ▼
//!                            └────────── Backoff ◄──┘
//!                                          │ attempts > cap
//!                                          ▼
//!                                      Exhausted
//! ```
//!
//! `stop` moves any non-terminal state to `Stopped`.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use super::ReconnectPolicy;

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of the endpoint's connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Not started yet.
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// The connection is open and serving requests.
    Connected,
    /// Waiting before the next reconnect attempt.
    Backoff,
    /// Reconnect cap reached; no further attempts. Terminal.
    Exhausted,
    /// Stopped by the application. Terminal.
    Stopped,
}

impl ConnectionState {
    /// Returns `true` for states the endpoint never leaves.
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Exhausted | Self::Stopped)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Backoff => "backoff",
            Self::Exhausted => "exhausted",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Directive
// ============================================================================

/// What the supervisor must do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Open a new transport connection.
    Connect,
    /// Sleep, then report [`Lifecycle::backoff_elapsed`].
    Wait(Duration),
    /// Keep serving the current connection.
    Continue,
    /// Reconnect cap reached.
    GiveUp,
    /// Application asked to stop.
    Halt,
}

// ============================================================================
// Lifecycle
// ============================================================================

/// State and attempt counter for one endpoint.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    policy: ReconnectPolicy,
    state: ConnectionState,
    /// Consecutive failed connections since the last successful open or
    /// received message.
    attempts: u32,
    /// Connections opened so far, including the first.
    connects: u32,
}

impl Lifecycle {
    /// Creates a lifecycle in [`ConnectionState::Disconnected`].
    #[must_use]
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            state: ConnectionState::Disconnected,
            attempts: 0,
            connects: 0,
        }
    }

    /// Returns the current state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns the attempt counter.
    #[inline]
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Returns the number of connection attempts started.
    #[inline]
    #[must_use]
    pub fn connects(&self) -> u32 {
        self.connects
    }

    /// `Disconnected → Connecting`.
    pub fn start(&mut self) -> Directive {
        match self.state {
            ConnectionState::Disconnected => self.connect(),
            _ => Directive::Continue,
        }
    }

    /// `Connecting → Connected`; resets the attempt counter.
    pub fn opened(&mut self) -> Directive {
        if self.state == ConnectionState::Connecting {
            self.state = ConnectionState::Connected;
            self.attempts = 0;
        }
        Directive::Continue
    }

    /// Live traffic resets the attempt counter.
    ///
    /// Returns `true` if the counter changed.
    pub fn message_received(&mut self) -> bool {
        let changed = self.attempts != 0;
        self.attempts = 0;
        changed
    }

    /// `Connecting | Connected → Backoff`, or `→ Exhausted` past the cap.
    pub fn closed(&mut self) -> Directive {
        if !matches!(
            self.state,
            ConnectionState::Connecting | ConnectionState::Connected
        ) {
            return Directive::Continue;
        }

        self.attempts = self.attempts.saturating_add(1);

        if self.policy.exceeds_cap(self.attempts) {
            self.state = ConnectionState::Exhausted;
            return Directive::GiveUp;
        }

        self.state = ConnectionState::Backoff;
        Directive::Wait(self.policy.delay_for_attempt(self.attempts))
    }

    /// `Backoff → Connecting`.
    pub fn backoff_elapsed(&mut self) -> Directive {
        match self.state {
            ConnectionState::Backoff => self.connect(),
            _ => Directive::Continue,
        }
    }

    /// Any non-terminal state `→ Stopped`.
    pub fn stop(&mut self) -> Directive {
        if self.state.is_terminal() {
            return Directive::Continue;
        }
        self.state = ConnectionState::Stopped;
        Directive::Halt
    }

    fn connect(&mut self) -> Directive {
        self.state = ConnectionState::Connecting;
        self.connects = self.connects.saturating_add(1);
        Directive::Connect
    }
}

// ============================================================================
// Tests
// ============================================================================
