//! Circuit breaker for authentication-adjacent datastore access.
//!
//! Owned by the [`StorageEngine`](crate::StorageEngine) and handed to callers,
//! never held as process-global state. Time is passed in explicitly so tests
//! can drive it deterministically.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use warden_core::config::defaults::DEFAULT_BREAKER_OPEN_SECS;
use warden_core::errors::{WardenError, WardenResult};

#[derive(Debug, Default)]
struct BreakerState {
    open_until: Option<DateTime<Utc>>,
    last_logged: Option<DateTime<Utc>>,
}

/// Fails fast with `ServiceUnavailable` for a short period after an outage.
#[derive(Debug)]
pub struct CircuitBreaker {
    open_for: Duration,
    state: Mutex<BreakerState>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_BREAKER_OPEN_SECS))
    }
}

impl CircuitBreaker {
    pub fn new(open_for: Duration) -> Self {
        Self {
            open_for,
            state: Mutex::new(BreakerState::default()),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.state().open_until.is_some_and(|until| until > now)
    }

    /// Reject immediately while open.
    pub fn check(&self, now: DateTime<Utc>) -> WardenResult<()> {
        if self.is_open(now) {
            return Err(WardenError::ServiceUnavailable);
        }
        Ok(())
    }

    /// Open the breaker. The error is logged at most once per open interval.
    pub fn trip(&self, now: DateTime<Utc>, cause: &WardenError) {
        let mut state = self.state();
        state.open_until = Some(now + self.open_for);
        let should_log = state
            .last_logged
            .map_or(true, |last| now - last >= self.open_for);
        if should_log {
            state.last_logged = Some(now);
            tracing::error!(
                error = %cause,
                open_secs = self.open_for.num_seconds(),
                "datastore unavailable, circuit breaker opened"
            );
        }
    }

    /// Run `f` behind the breaker. An outage trips it and is reported as
    /// `ServiceUnavailable`; other errors pass through untouched.
    pub fn guard<F, T>(&self, now: DateTime<Utc>, f: F) -> WardenResult<T>
    where
        F: FnOnce() -> WardenResult<T>,
    {
        self.check(now)?;
        match f() {
            Err(e) if e.is_outage() => {
                self.trip(now, &e);
                Err(WardenError::ServiceUnavailable)
            }
            other => other,
        }
    }
}
