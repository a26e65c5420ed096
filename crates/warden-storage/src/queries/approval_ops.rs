//! Approval requests.

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use warden_core::errors::WardenResult;
use warden_core::models::{ApprovalRequest, ApprovalStatus, RiskLevel};

use crate::{map_sqlite_err, parse_ts, to_storage_err};

pub struct InsertApprovalParams<'a> {
    pub id: &'a str,
    pub tenant_id: &'a str,
    pub risk_level: RiskLevel,
    pub requested_by: &'a str,
    pub payload_json: &'a str,
    pub created_at: &'a str,
}

pub fn insert_approval(conn: &Connection, p: &InsertApprovalParams<'_>) -> WardenResult<()> {
    debug!(approval_id = p.id, tenant_id = p.tenant_id, "inserting approval request");
    conn.execute(
        "INSERT INTO approval_requests (id, tenant_id, status, risk_level, requested_by, payload_json, created_at)
         VALUES (?1, ?2, 'PENDING', ?3, ?4, ?5, ?6)",
        params![p.id, p.tenant_id, p.risk_level.as_str(), p.requested_by, p.payload_json, p.created_at],
    )
    .map_err(map_sqlite_err)?;
    Ok(())
}

const APPROVAL_COLUMNS: &str = "id, tenant_id, status, risk_level, requested_by, payload_json,
     created_at, decided_at, decided_by, reason";

struct RawApproval {
    id: String,
    tenant_id: String,
    status: String,
    risk_level: String,
    requested_by: String,
    payload_json: String,
    created_at: String,
    decided_at: Option<String>,
    decided_by: Option<String>,
    reason: Option<String>,
}

impl RawApproval {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            tenant_id: row.get(1)?,
            status: row.get(2)?,
            risk_level: row.get(3)?,
            requested_by: row.get(4)?,
            payload_json: row.get(5)?,
            created_at: row.get(6)?,
            decided_at: row.get(7)?,
            decided_by: row.get(8)?,
            reason: row.get(9)?,
        })
    }

    fn into_model(self) -> WardenResult<ApprovalRequest> {
        Ok(ApprovalRequest {
            status: ApprovalStatus::parse(&self.status)
                .ok_or_else(|| to_storage_err(format!("unknown approval status {:?}", self.status)))?,
            risk_level: RiskLevel::parse(&self.risk_level)
                .ok_or_else(|| to_storage_err(format!("unknown risk level {:?}", self.risk_level)))?,
            // Unparsable payloads load as null so the decision path can report them.
            payload: serde_json::from_str(&self.payload_json).unwrap_or(serde_json::Value::Null),
            created_at: parse_ts(&self.created_at)?,
            decided_at: self.decided_at.as_deref().map(parse_ts).transpose()?,
            id: self.id,
            tenant_id: self.tenant_id,
            requested_by: self.requested_by,
            decided_by: self.decided_by,
            reason: self.reason,
        })
    }
}

pub fn get_approval(conn: &Connection, id: &str) -> WardenResult<Option<ApprovalRequest>> {
    debug!(approval_id = id, "getting approval request");
    conn.query_row(
        &format!("SELECT {APPROVAL_COLUMNS} FROM approval_requests WHERE id = ?1"),
        params![id],
        RawApproval::from_row,
    )
    .optional()
    .map_err(map_sqlite_err)?
    .map(RawApproval::into_model)
    .transpose()
}

/// Newest PENDING request of the given tier by `requested_by` created at or after `since`.
pub fn latest_pending_since(
    conn: &Connection,
    tenant_id: &str,
    requested_by: &str,
    risk_level: RiskLevel,
    since: &str,
) -> WardenResult<Option<chrono::DateTime<chrono::Utc>>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT created_at FROM approval_requests
             WHERE tenant_id = ?1 AND requested_by = ?2 AND status = 'PENDING'
               AND risk_level = ?3 AND created_at >= ?4
             ORDER BY created_at DESC LIMIT 1",
            params![tenant_id, requested_by, risk_level.as_str(), since],
            |row| row.get(0),
        )
        .optional()
        .map_err(map_sqlite_err)?;
    raw.as_deref().map(parse_ts).transpose()
}

/// Requests of any status by `requested_by` created at or after `since`.
pub fn count_requests_since(
    conn: &Connection,
    tenant_id: &str,
    requested_by: &str,
    since: &str,
) -> WardenResult<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM approval_requests
         WHERE tenant_id = ?1 AND requested_by = ?2 AND created_at >= ?3",
        params![tenant_id, requested_by, since],
        |row| row.get(0),
    )
    .map_err(map_sqlite_err)
}

/// Record a decision. Only PENDING rows are touched; returns rows changed.
pub fn set_decision(
    conn: &Connection,
    id: &str,
    status: ApprovalStatus,
    decided_by: &str,
    decided_at: &str,
    reason: Option<&str>,
) -> WardenResult<usize> {
    debug!(approval_id = id, status = status.as_str(), decided_by, "recording approval decision");
    conn.execute(
        "UPDATE approval_requests
         SET status = ?2, decided_by = ?3, decided_at = ?4, reason = ?5
         WHERE id = ?1 AND status = 'PENDING'",
        params![id, status.as_str(), decided_by, decided_at, reason],
    )
    .map_err(map_sqlite_err)
}

/// PENDING requests for a tenant, newest first.
pub fn list_pending(conn: &Connection, tenant_id: &str, limit: usize) -> WardenResult<Vec<ApprovalRequest>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {APPROVAL_COLUMNS} FROM approval_requests
             WHERE tenant_id = ?1 AND status = 'PENDING'
             ORDER BY created_at DESC, id DESC LIMIT ?2"
        ))
        .map_err(map_sqlite_err)?;
    let rows = stmt
        .query_map(params![tenant_id, limit as i64], RawApproval::from_row)
        .map_err(map_sqlite_err)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(map_sqlite_err)?.into_model()?);
    }
    Ok(out)
}
