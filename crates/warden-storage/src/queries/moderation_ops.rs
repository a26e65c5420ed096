//! Players, moderation actions, cases and reports.

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use warden_core::errors::WardenResult;
use warden_core::models::{
    ActionType, CaseRecord, CaseStatus, ModerationAction, Player, PlayerStatus, Report,
    ReportStatus,
};

use crate::{map_sqlite_err, parse_ts, to_storage_err};

fn bad_enum(kind: &str, value: &str) -> warden_core::WardenError {
    to_storage_err(format!("unknown {kind} value {value:?}"))
}

// ── Players ─────────────────────────────────────────────────────────────────

pub fn insert_player(
    conn: &Connection,
    id: &str,
    tenant_id: &str,
    name: &str,
    created_at: &str,
) -> WardenResult<()> {
    debug!(player_id = id, tenant_id, "inserting player");
    conn.execute(
        "INSERT INTO players (id, tenant_id, name, status, created_at) VALUES (?1, ?2, ?3, 'ACTIVE', ?4)",
        params![id, tenant_id, name, created_at],
    )
    .map_err(map_sqlite_err)?;
    Ok(())
}

pub fn get_player(conn: &Connection, id: &str) -> WardenResult<Option<Player>> {
    debug!(player_id = id, "getting player");
    let raw: Option<(String, String, String, String)> = conn
        .query_row(
            "SELECT id, tenant_id, name, status FROM players WHERE id = ?1",
            params![id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .optional()
        .map_err(map_sqlite_err)?;

    raw.map(|(id, tenant_id, name, status)| {
        Ok(Player {
            status: PlayerStatus::parse(&status).ok_or_else(|| bad_enum("player status", &status))?,
            id,
            tenant_id,
            name,
        })
    })
    .transpose()
}

/// Returns the number of rows changed (0 when the player is not in the tenant).
pub fn update_player_status(
    conn: &Connection,
    tenant_id: &str,
    id: &str,
    status: PlayerStatus,
) -> WardenResult<usize> {
    debug!(player_id = id, status = status.as_str(), "updating player status");
    conn.execute(
        "UPDATE players SET status = ?3 WHERE id = ?1 AND tenant_id = ?2",
        params![id, tenant_id, status.as_str()],
    )
    .map_err(map_sqlite_err)
}

// ── Actions ─────────────────────────────────────────────────────────────────

pub struct InsertActionParams<'a> {
    pub id: &'a str,
    pub tenant_id: &'a str,
    pub action_type: ActionType,
    pub player_id: &'a str,
    pub moderator_id: &'a str,
    pub reason: &'a str,
    pub duration_minutes: Option<i64>,
    pub evidence_urls: &'a [String],
    pub created_at: &'a str,
}

pub fn insert_action(conn: &Connection, p: &InsertActionParams<'_>) -> WardenResult<()> {
    debug!(action_id = p.id, action_type = p.action_type.as_str(), "inserting action");
    let evidence = serde_json::to_string(p.evidence_urls)?;
    conn.execute(
        "INSERT INTO actions (id, tenant_id, action_type, player_id, moderator_id, reason,
                              duration_minutes, evidence_urls, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            p.id,
            p.tenant_id,
            p.action_type.as_str(),
            p.player_id,
            p.moderator_id,
            p.reason,
            p.duration_minutes,
            evidence,
            p.created_at,
        ],
    )
    .map_err(map_sqlite_err)?;
    Ok(())
}

struct RawAction {
    id: String,
    tenant_id: String,
    action_type: String,
    player_id: String,
    moderator_id: String,
    reason: String,
    duration_minutes: Option<i64>,
    evidence_urls: String,
    created_at: String,
    revoked_at: Option<String>,
    revoked_by: Option<String>,
    revoked_reason: Option<String>,
}

impl RawAction {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            tenant_id: row.get(1)?,
            action_type: row.get(2)?,
            player_id: row.get(3)?,
            moderator_id: row.get(4)?,
            reason: row.get(5)?,
            duration_minutes: row.get(6)?,
            evidence_urls: row.get(7)?,
            created_at: row.get(8)?,
            revoked_at: row.get(9)?,
            revoked_by: row.get(10)?,
            revoked_reason: row.get(11)?,
        })
    }

    fn into_model(self) -> WardenResult<ModerationAction> {
        Ok(ModerationAction {
            action_type: ActionType::parse(&self.action_type)
                .ok_or_else(|| bad_enum("action type", &self.action_type))?,
            evidence_urls: serde_json::from_str(&self.evidence_urls)?,
            created_at: parse_ts(&self.created_at)?,
            revoked_at: self.revoked_at.as_deref().map(parse_ts).transpose()?,
            id: self.id,
            tenant_id: self.tenant_id,
            player_id: self.player_id,
            moderator_id: self.moderator_id,
            reason: self.reason,
            duration_minutes: self.duration_minutes,
            revoked_by: self.revoked_by,
            revoked_reason: self.revoked_reason,
        })
    }
}

const ACTION_COLUMNS: &str = "id, tenant_id, action_type, player_id, moderator_id, reason,
     duration_minutes, evidence_urls, created_at, revoked_at, revoked_by, revoked_reason";

pub fn get_action(conn: &Connection, id: &str) -> WardenResult<Option<ModerationAction>> {
    debug!(action_id = id, "getting action");
    conn.query_row(
        &format!("SELECT {ACTION_COLUMNS} FROM actions WHERE id = ?1"),
        params![id],
        RawAction::from_row,
    )
    .optional()
    .map_err(map_sqlite_err)?
    .map(RawAction::into_model)
    .transpose()
}

pub fn list_actions_for_player(
    conn: &Connection,
    tenant_id: &str,
    player_id: &str,
) -> WardenResult<Vec<ModerationAction>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {ACTION_COLUMNS} FROM actions
             WHERE tenant_id = ?1 AND player_id = ?2 ORDER BY created_at, id"
        ))
        .map_err(map_sqlite_err)?;
    let rows = stmt
        .query_map(params![tenant_id, player_id], RawAction::from_row)
        .map_err(map_sqlite_err)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(map_sqlite_err)?.into_model()?);
    }
    Ok(out)
}

pub fn update_action_duration(
    conn: &Connection,
    tenant_id: &str,
    id: &str,
    duration_minutes: i64,
) -> WardenResult<usize> {
    debug!(action_id = id, duration_minutes, "updating action duration");
    conn.execute(
        "UPDATE actions SET duration_minutes = ?3 WHERE id = ?1 AND tenant_id = ?2",
        params![id, tenant_id, duration_minutes],
    )
    .map_err(map_sqlite_err)
}

pub fn revoke_action(
    conn: &Connection,
    tenant_id: &str,
    id: &str,
    revoked_by: &str,
    reason: &str,
    revoked_at: &str,
) -> WardenResult<usize> {
    debug!(action_id = id, "revoking action");
    conn.execute(
        "UPDATE actions SET revoked_at = ?3, revoked_by = ?4, revoked_reason = ?5
         WHERE id = ?1 AND tenant_id = ?2 AND revoked_at IS NULL",
        params![id, tenant_id, revoked_at, revoked_by, reason],
    )
    .map_err(map_sqlite_err)
}

// ── Cases ───────────────────────────────────────────────────────────────────

pub struct InsertCaseParams<'a> {
    pub id: &'a str,
    pub tenant_id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub assigned_to: Option<&'a str>,
    pub created_at: &'a str,
}

pub fn insert_case(conn: &Connection, p: &InsertCaseParams<'_>) -> WardenResult<()> {
    debug!(case_id = p.id, tenant_id = p.tenant_id, "inserting case");
    conn.execute(
        "INSERT INTO cases (id, tenant_id, title, description, status, assigned_to, created_at)
         VALUES (?1, ?2, ?3, ?4, 'OPEN', ?5, ?6)",
        params![p.id, p.tenant_id, p.title, p.description, p.assigned_to, p.created_at],
    )
    .map_err(map_sqlite_err)?;
    Ok(())
}

pub fn get_case(conn: &Connection, id: &str) -> WardenResult<Option<CaseRecord>> {
    debug!(case_id = id, "getting case");
    type RawCase = (String, String, String, String, String, Option<String>, String);
    let raw: Option<RawCase> = conn
        .query_row(
            "SELECT id, tenant_id, title, description, status, assigned_to, created_at
             FROM cases WHERE id = ?1",
            params![id],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                ))
            },
        )
        .optional()
        .map_err(map_sqlite_err)?;

    raw.map(|(id, tenant_id, title, description, status, assigned_to, created_at)| {
        Ok(CaseRecord {
            status: CaseStatus::parse(&status).ok_or_else(|| bad_enum("case status", &status))?,
            created_at: parse_ts(&created_at)?,
            id,
            tenant_id,
            title,
            description,
            assigned_to,
        })
    })
    .transpose()
}

pub fn link_case_player(conn: &Connection, case_id: &str, player_id: &str) -> WardenResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO case_players (case_id, player_id) VALUES (?1, ?2)",
        params![case_id, player_id],
    )
    .map_err(map_sqlite_err)?;
    Ok(())
}

pub fn case_player_ids(conn: &Connection, case_id: &str) -> WardenResult<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT player_id FROM case_players WHERE case_id = ?1 ORDER BY player_id")
        .map_err(map_sqlite_err)?;
    let rows = stmt
        .query_map(params![case_id], |row| row.get(0))
        .map_err(map_sqlite_err)?;
    rows.collect::<Result<Vec<String>, _>>().map_err(map_sqlite_err)
}

pub fn update_case_assignee(
    conn: &Connection,
    tenant_id: &str,
    id: &str,
    assigned_to: &str,
) -> WardenResult<usize> {
    debug!(case_id = id, assigned_to, "assigning case");
    conn.execute(
        "UPDATE cases SET assigned_to = ?3 WHERE id = ?1 AND tenant_id = ?2",
        params![id, tenant_id, assigned_to],
    )
    .map_err(map_sqlite_err)
}

// ── Reports ─────────────────────────────────────────────────────────────────

pub struct InsertReportParams<'a> {
    pub id: &'a str,
    pub tenant_id: &'a str,
    pub summary: &'a str,
    pub reporter_name: Option<&'a str>,
    pub reporter_contact: Option<&'a str>,
    pub accused_player_id: Option<&'a str>,
    pub created_at: &'a str,
}

pub fn insert_report(conn: &Connection, p: &InsertReportParams<'_>) -> WardenResult<()> {
    debug!(report_id = p.id, tenant_id = p.tenant_id, "inserting report");
    conn.execute(
        "INSERT INTO reports (id, tenant_id, summary, reporter_name, reporter_contact,
                              accused_player_id, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'OPEN', ?7)",
        params![
            p.id,
            p.tenant_id,
            p.summary,
            p.reporter_name,
            p.reporter_contact,
            p.accused_player_id,
            p.created_at,
        ],
    )
    .map_err(map_sqlite_err)?;
    Ok(())
}

pub fn get_report(conn: &Connection, id: &str) -> WardenResult<Option<Report>> {
    debug!(report_id = id, "getting report");
    struct RawReport {
        id: String,
        tenant_id: String,
        summary: String,
        reporter_name: Option<String>,
        reporter_contact: Option<String>,
        accused_player_id: Option<String>,
        status: String,
        case_id: Option<String>,
        created_at: String,
    }
    let raw = conn
        .query_row(
            "SELECT id, tenant_id, summary, reporter_name, reporter_contact, accused_player_id,
                    status, case_id, created_at
             FROM reports WHERE id = ?1",
            params![id],
            |row| {
                Ok(RawReport {
                    id: row.get(0)?,
                    tenant_id: row.get(1)?,
                    summary: row.get(2)?,
                    reporter_name: row.get(3)?,
                    reporter_contact: row.get(4)?,
                    accused_player_id: row.get(5)?,
                    status: row.get(6)?,
                    case_id: row.get(7)?,
                    created_at: row.get(8)?,
                })
            },
        )
        .optional()
        .map_err(map_sqlite_err)?;

    raw.map(|r| {
        Ok(Report {
            status: ReportStatus::parse(&r.status)
                .ok_or_else(|| bad_enum("report status", &r.status))?,
            created_at: parse_ts(&r.created_at)?,
            id: r.id,
            tenant_id: r.tenant_id,
            summary: r.summary,
            reporter_name: r.reporter_name,
            reporter_contact: r.reporter_contact,
            accused_player_id: r.accused_player_id,
            case_id: r.case_id,
        })
    })
    .transpose()
}

pub fn attach_report_to_case(
    conn: &Connection,
    tenant_id: &str,
    report_id: &str,
    case_id: &str,
    status: ReportStatus,
) -> WardenResult<usize> {
    debug!(report_id, case_id, "attaching report to case");
    conn.execute(
        "UPDATE reports SET case_id = ?3, status = ?4 WHERE id = ?1 AND tenant_id = ?2",
        params![report_id, tenant_id, case_id, status.as_str()],
    )
    .map_err(map_sqlite_err)
}

/// Update every listed report that belongs to `tenant_id`. Ids from other
/// tenants are silently skipped. Returns the number of rows changed.
pub fn bulk_update_report_status(
    conn: &Connection,
    tenant_id: &str,
    report_ids: &[String],
    status: ReportStatus,
) -> WardenResult<usize> {
    debug!(tenant_id, count = report_ids.len(), status = status.as_str(), "bulk updating reports");
    let mut stmt = conn
        .prepare("UPDATE reports SET status = ?3 WHERE id = ?1 AND tenant_id = ?2")
        .map_err(map_sqlite_err)?;
    let mut changed = 0;
    for id in report_ids {
        changed += stmt
            .execute(params![id, tenant_id, status.as_str()])
            .map_err(map_sqlite_err)?;
    }
    Ok(changed)
}
