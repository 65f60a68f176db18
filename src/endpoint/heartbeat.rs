//! Keepalive timer.
//!
//! Ticks only while a connection is open. Each new open restarts the
//! interval from zero so a fresh connection never pings immediately.

// ============================================================================
// Imports
// ============================================================================

use std::future::pending;
use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

// ============================================================================
// Heartbeat
// ============================================================================

/// Restartable keepalive interval.
#[derive(Debug)]
pub(crate) struct Heartbeat {
    /// Configured period; `None` disables the heartbeat.
    period: Option<Duration>,
    /// Running interval while connected.
    interval: Option<Interval>,
}

impl Heartbeat {
    /// Creates a stopped heartbeat.
    pub(crate) fn new(period: Option<Duration>) -> Self {
        Self {
            period,
            interval: None,
        }
    }

    /// (Re)starts ticking; the first tick fires one period from now.
    pub(crate) fn start(&mut self) {
        self.interval = self.period.map(|period| {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
    }

    /// Stops ticking.
    pub(crate) fn stop(&mut self) {
        self.interval = None;
    }

    /// Returns `true` while ticking.
    #[cfg(test)]
    pub(crate) fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    /// Waits for the next tick; never completes while stopped.
    pub(crate) async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => pending::<()>().await,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
