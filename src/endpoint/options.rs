//! Reconnect and keepalive configuration.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use ws_rpc_endpoint::ReconnectPolicy;
//!
//! let policy = ReconnectPolicy::new()
//!     .with_max_attempts(5)
//!     .with_delay(Duration::from_secs(1))
//!     .with_exponential_backoff(2.0, Duration::from_secs(30))
//!     .with_heartbeat(Duration::from_secs(15));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default cap on consecutive reconnect attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default delay before each reconnect attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// Default keepalive interval.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(25_000);

// ============================================================================
// Backoff
// ============================================================================

/// How the reconnect delay evolves across consecutive attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Same delay before every attempt.
    Fixed,
    /// Delay multiplied by `factor` after each failed attempt, capped.
    Exponential {
        /// Multiplier applied per attempt (≥ 1.0).
        factor: f64,
        /// Upper bound on the delay.
        max_delay: Duration,
    },
}

// ============================================================================
// ReconnectPolicy
// ============================================================================

/// Connection supervision settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    /// Consecutive reconnect attempts allowed since the last successful
    /// open. `None` retries forever.
    pub max_attempts: Option<u32>,

    /// Delay before the first reconnect attempt.
    pub delay: Duration,

    /// Delay progression.
    pub backoff: Backoff,

    /// Keepalive ping interval while connected. `None` disables pings.
    pub heartbeat: Option<Duration>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ReconnectPolicy {
    /// Creates the default policy: 10 attempts, fixed 3 s delay, 25 s
    /// heartbeat.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
            delay: DEFAULT_RECONNECT_DELAY,
            backoff: Backoff::Fixed,
            heartbeat: Some(DEFAULT_HEARTBEAT_INTERVAL),
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ReconnectPolicy {
    /// Sets the reconnect attempt cap.
    #[inline]
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Removes the reconnect attempt cap.
    #[inline]
    #[must_use]
    pub fn with_unlimited_attempts(mut self) -> Self {
        self.max_attempts = None;
        self
    }

    /// Sets the reconnect delay.
    #[inline]
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Switches to exponential backoff.
    #[inline]
    #[must_use]
    pub fn with_exponential_backoff(mut self, factor: f64, max_delay: Duration) -> Self {
        self.backoff = Backoff::Exponential { factor, max_delay };
        self
    }

    /// Sets the heartbeat interval.
    #[inline]
    #[must_use]
    pub fn with_heartbeat(mut self, interval: Duration) -> Self {
        self.heartbeat = Some(interval);
        self
    }

    /// Disables the heartbeat.
    #[inline]
    #[must_use]
    pub fn without_heartbeat(mut self) -> Self {
        self.heartbeat = None;
        self
    }
}

// ============================================================================
// Queries
// ============================================================================

impl ReconnectPolicy {
    /// Returns the delay before reconnect attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential { factor, max_delay } => {
                let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
                let millis = self.delay.as_millis() as f64 * factor.powi(exponent);
                let capped = millis.min(max_delay.as_millis() as f64);
                Duration::from_millis(capped as u64)
            }
        }
    }

    /// Returns `true` if reconnect attempt number `attempt` exceeds the cap.
    #[inline]
    #[must_use]
    pub fn exceeds_cap(&self, attempt: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempt > max)
    }

    /// Checks the policy for values the supervisor cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a zero heartbeat interval or an
    /// exponential factor below 1.0.
    pub fn validate(&self) -> Result<()> {
        if self.heartbeat.is_some_and(|interval| interval.is_zero()) {
            return Err(Error::config(
                "Heartbeat interval must be non-zero. Use .without_heartbeat() to disable it.",
            ));
        }

        if let Backoff::Exponential { factor, .. } = self.backoff
            && !(factor.is_finite() && factor >= 1.0)
        {
            return Err(Error::config(format!(
                "Exponential backoff factor must be at least 1.0, got {factor}"
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
