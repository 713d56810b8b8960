//! Collect-trigger throttle.
//!
//! At most one collect request may be in flight, and unforced attempts are
//! spaced at least `cooldown` apart. The throttle only tracks state; the
//! poller does the I/O.

use std::time::Duration;
use tokio::time::Instant;

/// Why a collect trigger did not send a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Collect is turned off in configuration
    Disabled,
    /// Another collect request has not finished yet
    InFlight,
    /// The last attempt was too recent
    Cooldown,
    /// The session is gone; nothing is sent until the user signs in again
    LoginRequired,
}

/// Result of [`Poller::trigger_collect`](super::Poller::trigger_collect)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectOutcome {
    Sent,
    Failed(String),
    LoginRequired,
    Skipped(SkipReason),
}

/// In-flight flag, last attempt time and last error
#[derive(Debug)]
pub struct CollectThrottle {
    cooldown: Duration,
    in_flight: bool,
    last_attempt: Option<Instant>,
    last_error: String,
}

impl CollectThrottle {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            in_flight: false,
            last_attempt: None,
            last_error: String::new(),
        }
    }

    /// Claim the in-flight slot.
    ///
    /// `force` bypasses the cooldown but never the in-flight check.
    pub fn try_begin(&mut self, force: bool, now: Instant) -> Result<(), SkipReason> {
        if self.in_flight {
            return Err(SkipReason::InFlight);
        }
        if !force {
            if let Some(last) = self.last_attempt {
                if now.saturating_duration_since(last) < self.cooldown {
                    return Err(SkipReason::Cooldown);
                }
            }
        }
        self.in_flight = true;
        self.last_attempt = Some(now);
        Ok(())
    }

    pub fn finish_ok(&mut self) {
        self.in_flight = false;
        self.last_error.clear();
    }

    pub fn finish_err(&mut self, message: String) {
        self.in_flight = false;
        self.last_error = message;
    }

    /// Release the slot after an authorization failure without touching
    /// the recorded error.
    pub fn finish_auth(&mut self) {
        self.in_flight = false;
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn last_attempt(&self) -> Option<Instant> {
        self.last_attempt
    }

    /// Last collect error, empty if the last attempt succeeded
    pub fn last_error(&self) -> &str {
        &self.last_error
    }
}
