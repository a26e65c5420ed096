//! Login throttling: an in-process rate limiter, account lockout derived
//! from the attempt history, and the `login_failed_burst` detector.
//!
//! Credential verification is the caller's business; this module only
//! decides whether an attempt may proceed and records what happened.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rusqlite::Connection;
use serde_json::json;
use tracing::{info, warn};

use warden_core::config::LoginConfig;
use warden_core::errors::WardenResult;
use warden_core::models::{AuditEvent, NewAuditEntry, SecuritySettings};
use warden_storage::queries::login_ops::{self, InsertLoginAttemptParams};
use warden_storage::{fmt_ts, AuditMode};

use crate::context::{ClientInfo, EngineContext};
use crate::signals::{maybe_record_login_burst, LoginFailure};

#[derive(Debug, Clone, Copy)]
struct Window {
    attempts: u32,
    reset_at: DateTime<Utc>,
}

/// Result of one [`RateLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

/// Fixed-window limiter keyed by an arbitrary identifier.
///
/// State lives in this process only, so limits are approximate when several
/// processes serve logins.
#[derive(Debug)]
pub struct RateLimiter {
    max_attempts: u32,
    window: Duration,
    store: DashMap<String, Window>,
}

impl RateLimiter {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            store: DashMap::new(),
        }
    }

    pub fn from_config(config: &LoginConfig) -> Self {
        Self::new(config.max_attempts, Duration::minutes(config.window_minutes))
    }

    /// Count one attempt for `key` and say whether it may proceed.
    pub fn check(&self, key: &str, now: DateTime<Utc>) -> RateDecision {
        let mut entry = self.store.entry(key.to_string()).or_insert(Window {
            attempts: 0,
            reset_at: now + self.window,
        });
        let window = entry.value_mut();

        if window.reset_at < now || window.attempts == 0 {
            *window = Window {
                attempts: 1,
                reset_at: now + self.window,
            };
            return RateDecision {
                allowed: true,
                remaining: self.max_attempts.saturating_sub(1),
                reset_at: window.reset_at,
            };
        }

        if window.attempts >= self.max_attempts {
            return RateDecision {
                allowed: false,
                remaining: 0,
                reset_at: window.reset_at,
            };
        }

        window.attempts += 1;
        RateDecision {
            allowed: true,
            remaining: self.max_attempts - window.attempts,
            reset_at: window.reset_at,
        }
    }

    /// Drop windows that have already reset.
    pub fn purge_expired(&self, now: DateTime<Utc>) {
        self.store.retain(|_, w| w.reset_at >= now);
    }
}

/// Whether a login attempt may go ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginGate {
    Allowed,
    RateLimited { retry_after: DateTime<Utc> },
    Locked { until: DateTime<Utc> },
}

/// A failed attempt to record.
#[derive(Debug, Clone)]
pub struct FailedLogin<'a> {
    pub email: &'a str,
    /// Known when the email matched an account.
    pub user_id: Option<&'a str>,
    /// Short machine-readable cause, e.g. `invalid_password`.
    pub reason: &'a str,
    pub client: &'a ClientInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureOutcome {
    pub failures: i64,
    pub locked_until: Option<DateTime<Utc>>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub struct LoginGuard {
    ctx: EngineContext,
    limiter: RateLimiter,
}

impl LoginGuard {
    pub fn new(ctx: EngineContext) -> Self {
        let limiter = RateLimiter::from_config(&ctx.config.login);
        Self { ctx, limiter }
    }

    fn policy(&self) -> &SecuritySettings {
        &self.ctx.config.security
    }

    /// Rate limit by `ip:email`, then refuse while the account is locked out.
    pub fn check_attempt(&self, email: &str, ip: Option<&str>) -> WardenResult<LoginGate> {
        let now = self.ctx.clock.now();
        let email = normalize_email(email);
        let key = format!("{}:{email}", ip.unwrap_or("unknown"));

        let decision = self.limiter.check(&key, now);
        if !decision.allowed {
            info!(email = %email, "login rate limited");
            return Ok(LoginGate::RateLimited {
                retry_after: decision.reset_at,
            });
        }

        let locked_until = self.ctx.storage.breaker().guard(now, || {
            self.ctx
                .storage
                .with_reader(|conn| locked_until(conn, self.policy(), &email, now))
        })?;
        Ok(match locked_until {
            Some(until) => LoginGate::Locked { until },
            None => LoginGate::Allowed,
        })
    }

    /// Record a failed attempt, update the lockout, write `login.failed`,
    /// and raise `login_failed_burst` when failures pile up.
    pub fn record_failure(&self, attempt: &FailedLogin<'_>) -> WardenResult<FailureOutcome> {
        let now = self.ctx.clock.now();
        let email = normalize_email(attempt.email);
        let policy = self.policy().clone();

        let outcome = self.ctx.storage.breaker().guard(now, || {
            self.ctx.storage.with_transaction(|conn| {
                login_ops::insert_attempt(
                    conn,
                    &InsertLoginAttemptParams {
                        email: &email,
                        user_id: attempt.user_id,
                        success: false,
                        ip: attempt.client.ip.as_deref(),
                        user_agent: attempt.client.user_agent.as_deref(),
                        created_at: &fmt_ts(&now),
                    },
                )?;

                let since = fmt_ts(&(now - Duration::minutes(policy.lockout_window_minutes)));
                let failures = login_ops::count_failures_since(conn, &email, &since)?;
                let locked_until = (failures >= policy.lockout_max_attempts)
                    .then(|| now + Duration::minutes(policy.lockout_duration_minutes));

                let mut entry = NewAuditEntry::new(
                    AuditEvent::LoginFailed,
                    json!({ "email": email, "reason": attempt.reason }),
                )
                .client(attempt.client.ip.clone(), attempt.client.user_agent.clone());
                entry.actor_id = attempt.user_id.map(str::to_string);
                self.ctx.audit.append(conn, entry, AuditMode::Strict)?;

                maybe_record_login_burst(
                    &self.ctx,
                    conn,
                    &policy,
                    &LoginFailure {
                        email: &email,
                        user_id: attempt.user_id,
                        ip: attempt.client.ip.as_deref(),
                        user_agent: attempt.client.user_agent.as_deref(),
                        failures,
                        locked: locked_until.is_some(),
                    },
                )?;

                Ok(FailureOutcome {
                    failures,
                    locked_until,
                })
            })
        })?;

        if let Some(until) = outcome.locked_until {
            warn!(email = %email, failures = outcome.failures, until = %until, "account locked out");
        }
        Ok(outcome)
    }

    /// Record a successful attempt.
    pub fn record_success(&self, email: &str, user_id: &str, client: &ClientInfo) -> WardenResult<()> {
        let now = self.ctx.clock.now();
        let email = normalize_email(email);
        self.ctx.storage.breaker().guard(now, || {
            self.ctx.storage.with_writer(|conn| {
                login_ops::insert_attempt(
                    conn,
                    &InsertLoginAttemptParams {
                        email: &email,
                        user_id: Some(user_id),
                        success: true,
                        ip: client.ip.as_deref(),
                        user_agent: client.user_agent.as_deref(),
                        created_at: &fmt_ts(&now),
                    },
                )
            })
        })
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }
}

/// End of the current lockout, if failures in the window reached the limit.
fn locked_until(
    conn: &Connection,
    policy: &SecuritySettings,
    email: &str,
    now: DateTime<Utc>,
) -> WardenResult<Option<DateTime<Utc>>> {
    let since = fmt_ts(&(now - Duration::minutes(policy.lockout_window_minutes)));
    if login_ops::count_failures_since(conn, email, &since)? < policy.lockout_max_attempts {
        return Ok(None);
    }
    let until = login_ops::latest_failure_since(conn, email, &since)?
        .map(|last| last + Duration::minutes(policy.lockout_duration_minutes));
    Ok(until.filter(|until| *until > now))
}
