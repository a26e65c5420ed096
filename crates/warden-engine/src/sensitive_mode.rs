//! Sensitive mode: a short-lived, per-session elevation that HIGH-risk
//! operations require when the tenant says so.

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde_json::json;
use tracing::info;

use warden_core::errors::{WardenError, WardenResult};
use warden_core::models::{AuditEvent, NewAuditEntry, SensitiveModeGrant, SensitiveModeStatus};
use warden_storage::queries::sensitive_mode_ops;
use warden_storage::AuditMode;

use crate::context::{ClientInfo, EngineContext};
use crate::settings::load_security_settings;

/// Fail with `SensitiveModeRequired` unless `session_token` carries an
/// unexpired grant for `user_id`.
pub fn require_sensitive_mode(
    conn: &Connection,
    now: DateTime<Utc>,
    user_id: &str,
    session_token: Option<&str>,
) -> WardenResult<()> {
    let Some(token) = session_token else {
        return Err(WardenError::SensitiveModeRequired);
    };
    match sensitive_mode_ops::get_grant(conn, token)? {
        Some(grant) if grant.is_valid_for(user_id, now) => Ok(()),
        _ => Err(WardenError::SensitiveModeRequired),
    }
}

pub struct SensitiveModeService {
    ctx: EngineContext,
}

impl SensitiveModeService {
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    /// Grant sensitive mode to the session for `ttl_minutes`, or for the
    /// tenant's configured TTL when `None`.
    pub fn enable(
        &self,
        tenant_id: &str,
        user_id: &str,
        session_token: &str,
        ttl_minutes: Option<i64>,
        client: &ClientInfo,
    ) -> WardenResult<SensitiveModeStatus> {
        let now = self.ctx.clock.now();
        self.ctx.storage.with_transaction(|conn| {
            let ttl = match ttl_minutes {
                Some(ttl) => ttl,
                None => {
                    load_security_settings(conn, tenant_id, &self.ctx.config.security)?
                        .sensitive_mode_ttl_minutes
                }
            };
            if ttl < 1 {
                return Err(WardenError::validation("Sensitive mode TTL must be at least 1 minute."));
            }
            let grant = SensitiveModeGrant {
                session_token: session_token.to_string(),
                user_id: user_id.to_string(),
                enabled_at: now,
                expires_at: now + Duration::minutes(ttl),
            };
            sensitive_mode_ops::upsert_grant(conn, &grant)?;
            self.ctx.audit.append(
                conn,
                NewAuditEntry::new(
                    AuditEvent::SensitiveModeEnabled,
                    json!({ "ttlMinutes": ttl }),
                )
                .tenant(tenant_id)
                .actor(user_id)
                .client(client.ip.clone(), client.user_agent.clone()),
                AuditMode::Strict,
            )?;
            info!(tenant_id, user_id, ttl_minutes = ttl, "sensitive mode enabled");
            Ok(SensitiveModeStatus {
                enabled: true,
                expires_at: Some(grant.expires_at),
            })
        })
    }

    /// Drop the session's grant. Only a grant held by `user_id` is removed.
    pub fn disable(
        &self,
        tenant_id: &str,
        user_id: &str,
        session_token: &str,
        client: &ClientInfo,
    ) -> WardenResult<()> {
        self.ctx.storage.with_transaction(|conn| {
            let held = sensitive_mode_ops::get_grant(conn, session_token)?
                .is_some_and(|grant| grant.user_id == user_id);
            if !held {
                return Ok(());
            }
            sensitive_mode_ops::delete_grant(conn, session_token)?;
            self.ctx.audit.append(
                conn,
                NewAuditEntry::new(AuditEvent::SensitiveModeDisabled, json!({}))
                    .tenant(tenant_id)
                    .actor(user_id)
                    .client(client.ip.clone(), client.user_agent.clone()),
                AuditMode::Strict,
            )?;
            info!(tenant_id, user_id, "sensitive mode disabled");
            Ok(())
        })
    }

    /// Current state of the session's grant. Expired grants and grants held
    /// by another user are deleted on sight.
    pub fn status(&self, user_id: &str, session_token: &str) -> WardenResult<SensitiveModeStatus> {
        let now = self.ctx.clock.now();
        self.ctx.storage.with_transaction(|conn| {
            let Some(grant) = sensitive_mode_ops::get_grant(conn, session_token)? else {
                return Ok(SensitiveModeStatus {
                    enabled: false,
                    expires_at: None,
                });
            };
            if !grant.is_valid_for(user_id, now) {
                sensitive_mode_ops::delete_grant(conn, session_token)?;
                return Ok(SensitiveModeStatus {
                    enabled: false,
                    expires_at: None,
                });
            }
            Ok(SensitiveModeStatus {
                enabled: true,
                expires_at: Some(grant.expires_at),
            })
        })
    }

    pub fn require(&self, user_id: &str, session_token: Option<&str>) -> WardenResult<()> {
        let now = self.ctx.clock.now();
        self.ctx
            .storage
            .with_reader(|conn| require_sensitive_mode(conn, now, user_id, session_token))
    }
}
