//! Command handlers. Each one mutates moderation state through the caller's
//! unit of work and writes its own audit event.

pub mod cases;
pub mod moderation;
pub mod reports;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde_json::Value;

use warden_core::errors::WardenResult;
use warden_core::models::{AuditEvent, NewAuditEntry};
use warden_storage::{fmt_ts, AuditChainWriter, AuditMode};

use crate::context::ClientInfo;
use crate::tenant_guard::TenantGuard;

/// Everything a handler may touch.
pub struct HandlerContext<'a> {
    pub conn: &'a Connection,
    pub tenant_id: &'a str,
    pub actor_id: &'a str,
    pub now: DateTime<Utc>,
    pub client: &'a ClientInfo,
    pub audit: &'a AuditChainWriter,
    pub guard: TenantGuard<'a>,
}

impl HandlerContext<'_> {
    pub fn now_ts(&self) -> String {
        fmt_ts(&self.now)
    }

    /// Strict audit append attributed to the acting user.
    pub fn audit(&self, event: AuditEvent, metadata: Value) -> WardenResult<()> {
        self.audit.append(
            self.conn,
            NewAuditEntry::new(event, metadata)
                .tenant(self.tenant_id)
                .actor(self.actor_id)
                .client(self.client.ip.clone(), self.client.user_agent.clone()),
            AuditMode::Strict,
        )?;
        Ok(())
    }
}

/// What a handler hands back besides success.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerOutput {
    pub redirect: Option<String>,
}

pub type HandlerFn = fn(&HandlerContext<'_>, &Value) -> WardenResult<HandlerOutput>;

/// Deserialize already-normalized input into a handler's typed form.
pub(crate) fn typed<T: DeserializeOwned>(input: &Value) -> WardenResult<T> {
    Ok(serde_json::from_value(input.clone())?)
}
