//! Warnings, kicks, bans, notes and player flags.

use serde::Deserialize;
use serde_json::{json, Value};

use warden_core::errors::{WardenError, WardenResult};
use warden_core::models::{ActionType, AuditEvent, PlayerStatus};
use warden_storage::new_id;
use warden_storage::queries::moderation_ops::{self, InsertActionParams};

use super::{typed, HandlerContext, HandlerOutput};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerReason {
    player_id: String,
    reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BanInput {
    player_id: String,
    reason: String,
    #[serde(default)]
    duration_minutes: Option<i64>,
    #[serde(default)]
    evidence_urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtendInput {
    action_id: String,
    extra_minutes: i64,
    reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoveInput {
    action_id: String,
    reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlagInput {
    player_id: String,
    status: PlayerStatus,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NoteInput {
    player_id: String,
    note: String,
}

struct NewAction<'a> {
    action_type: ActionType,
    player_id: &'a str,
    reason: &'a str,
    duration_minutes: Option<i64>,
    evidence_urls: &'a [String],
}

/// Guard the player, insert the action, write `action.created`.
fn record_action(ctx: &HandlerContext<'_>, action: NewAction<'_>) -> WardenResult<HandlerOutput> {
    ctx.guard.player(action.player_id)?;

    let id = new_id();
    moderation_ops::insert_action(
        ctx.conn,
        &InsertActionParams {
            id: &id,
            tenant_id: ctx.tenant_id,
            action_type: action.action_type,
            player_id: action.player_id,
            moderator_id: ctx.actor_id,
            reason: action.reason,
            duration_minutes: action.duration_minutes,
            evidence_urls: action.evidence_urls,
            created_at: &ctx.now_ts(),
        },
    )?;

    let mut metadata = json!({
        "actionId": id,
        "playerId": action.player_id,
        "type": action.action_type.as_str(),
    });
    if let Some(minutes) = action.duration_minutes {
        metadata["durationMinutes"] = json!(minutes);
    }
    ctx.audit(AuditEvent::ActionCreated, metadata)?;
    Ok(HandlerOutput::default())
}

pub fn create_warning(ctx: &HandlerContext<'_>, input: &Value) -> WardenResult<HandlerOutput> {
    let input: PlayerReason = typed(input)?;
    record_action(
        ctx,
        NewAction {
            action_type: ActionType::Warning,
            player_id: &input.player_id,
            reason: &input.reason,
            duration_minutes: None,
            evidence_urls: &[],
        },
    )
}

pub fn record_kick(ctx: &HandlerContext<'_>, input: &Value) -> WardenResult<HandlerOutput> {
    let input: PlayerReason = typed(input)?;
    record_action(
        ctx,
        NewAction {
            action_type: ActionType::Kick,
            player_id: &input.player_id,
            reason: &input.reason,
            duration_minutes: None,
            evidence_urls: &[],
        },
    )
}

pub fn temp_ban(ctx: &HandlerContext<'_>, input: &Value) -> WardenResult<HandlerOutput> {
    let input: BanInput = typed(input)?;
    let Some(minutes) = input.duration_minutes else {
        return Err(WardenError::validation("Duration (minutes) is required."));
    };
    record_action(
        ctx,
        NewAction {
            action_type: ActionType::TempBan,
            player_id: &input.player_id,
            reason: &input.reason,
            duration_minutes: Some(minutes),
            evidence_urls: &input.evidence_urls,
        },
    )
}

pub fn perm_ban(ctx: &HandlerContext<'_>, input: &Value) -> WardenResult<HandlerOutput> {
    let input: BanInput = typed(input)?;
    record_action(
        ctx,
        NewAction {
            action_type: ActionType::PermBan,
            player_id: &input.player_id,
            reason: &input.reason,
            duration_minutes: None,
            evidence_urls: &input.evidence_urls,
        },
    )
}

pub fn add_note(ctx: &HandlerContext<'_>, input: &Value) -> WardenResult<HandlerOutput> {
    let input: NoteInput = typed(input)?;
    record_action(
        ctx,
        NewAction {
            action_type: ActionType::Note,
            player_id: &input.player_id,
            reason: &input.note,
            duration_minutes: None,
            evidence_urls: &[],
        },
    )
}

pub fn extend_ban(ctx: &HandlerContext<'_>, input: &Value) -> WardenResult<HandlerOutput> {
    let input: ExtendInput = typed(input)?;
    let action = ctx.guard.action(&input.action_id)?;
    if action.action_type != ActionType::TempBan {
        return Err(WardenError::invalid_state("Only TEMP_BAN actions can be extended."));
    }

    let duration = action.duration_minutes.unwrap_or(0) + input.extra_minutes;
    let changed = moderation_ops::update_action_duration(ctx.conn, ctx.tenant_id, &action.id, duration)?;
    if changed != 1 {
        return Err(WardenError::not_found("Action"));
    }

    ctx.audit(
        AuditEvent::ActionCreated,
        json!({
            "actionId": action.id,
            "type": ActionType::TempBan.as_str(),
            "durationMinutes": duration,
            "reason": input.reason,
        }),
    )?;
    Ok(HandlerOutput::default())
}

pub fn remove_ban(ctx: &HandlerContext<'_>, input: &Value) -> WardenResult<HandlerOutput> {
    let input: RemoveInput = typed(input)?;
    let action = ctx.guard.action(&input.action_id)?;
    if !action.action_type.is_ban() {
        return Err(WardenError::invalid_state("Only ban actions can be removed."));
    }
    if action.revoked_at.is_some() {
        return Err(WardenError::invalid_state("This action is already revoked."));
    }

    let changed = moderation_ops::revoke_action(
        ctx.conn,
        ctx.tenant_id,
        &action.id,
        ctx.actor_id,
        &input.reason,
        &ctx.now_ts(),
    )?;
    if changed != 1 {
        return Err(WardenError::invalid_state("This action is already revoked."));
    }

    ctx.audit(
        AuditEvent::ActionRevoked,
        json!({ "actionId": action.id, "reason": input.reason }),
    )?;
    Ok(HandlerOutput::default())
}

pub fn flag_player(ctx: &HandlerContext<'_>, input: &Value) -> WardenResult<HandlerOutput> {
    let input: FlagInput = typed(input)?;
    ctx.guard.player(&input.player_id)?;
    moderation_ops::update_player_status(ctx.conn, ctx.tenant_id, &input.player_id, input.status)?;

    let mut metadata = json!({
        "playerId": input.player_id,
        "status": input.status.as_str(),
    });
    if let Some(reason) = input.reason {
        metadata["reason"] = json!(reason);
    }
    ctx.audit(AuditEvent::PlayerUpdated, metadata)?;
    Ok(HandlerOutput::default())
}
