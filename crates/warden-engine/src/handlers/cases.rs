use serde::Deserialize;
use serde_json::{json, Value};

use warden_core::constants::CASE_TITLE_FROM_SUMMARY_LEN;
use warden_core::errors::{WardenError, WardenResult};
use warden_core::models::{AuditEvent, ReportStatus};
use warden_storage::new_id;
use warden_storage::queries::identity_ops;
use warden_storage::queries::moderation_ops::{self, InsertCaseParams};

use super::{typed, HandlerContext, HandlerOutput};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FromReportInput {
    report_id: String,
    title: Option<String>,
    assign_to_user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignInput {
    case_id: String,
    user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaseRef {
    case_id: String,
}

fn require_member(ctx: &HandlerContext<'_>, user_id: &str) -> WardenResult<()> {
    if !identity_ops::is_member(ctx.conn, ctx.tenant_id, user_id)? {
        return Err(WardenError::validation("Assignee must be a member of this community."));
    }
    Ok(())
}

pub fn open_from_report(ctx: &HandlerContext<'_>, input: &Value) -> WardenResult<HandlerOutput> {
    let input: FromReportInput = typed(input)?;
    let report = ctx.guard.report(&input.report_id)?;

    if let Some(assignee) = input.assign_to_user_id.as_deref() {
        require_member(ctx, assignee)?;
    }

    let title = input
        .title
        .unwrap_or_else(|| report.summary.chars().take(CASE_TITLE_FROM_SUMMARY_LEN).collect());
    let description = [
        Some(format!("Report: {}", report.summary)),
        report.reporter_name.as_ref().map(|name| format!("Reporter: {name}")),
        report.reporter_contact.as_ref().map(|contact| format!("Contact: {contact}")),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join("\n");

    let case_id = new_id();
    moderation_ops::insert_case(
        ctx.conn,
        &InsertCaseParams {
            id: &case_id,
            tenant_id: ctx.tenant_id,
            title: &title,
            description: &description,
            assigned_to: input.assign_to_user_id.as_deref(),
            created_at: &ctx.now_ts(),
        },
    )?;

    if let Some(player_id) = report.accused_player_id.as_deref() {
        let in_tenant = moderation_ops::get_player(ctx.conn, player_id)?
            .is_some_and(|p| p.tenant_id == ctx.tenant_id);
        if in_tenant {
            moderation_ops::link_case_player(ctx.conn, &case_id, player_id)?;
        }
    }

    let status = match report.status {
        ReportStatus::Open => ReportStatus::InReview,
        other => other,
    };
    moderation_ops::attach_report_to_case(ctx.conn, ctx.tenant_id, &report.id, &case_id, status)?;

    ctx.audit(
        AuditEvent::CaseCreated,
        json!({ "caseId": case_id, "reportId": report.id }),
    )?;
    Ok(HandlerOutput::default())
}

pub fn assign(ctx: &HandlerContext<'_>, input: &Value) -> WardenResult<HandlerOutput> {
    let input: AssignInput = typed(input)?;
    let case = ctx.guard.case(&input.case_id)?;
    require_member(ctx, &input.user_id)?;

    let changed = moderation_ops::update_case_assignee(ctx.conn, ctx.tenant_id, &case.id, &input.user_id)?;
    if changed != 1 {
        return Err(WardenError::not_found("Case"));
    }
    ctx.audit(
        AuditEvent::CaseUpdated,
        json!({ "caseId": case.id, "assignedToUserId": input.user_id }),
    )?;
    Ok(HandlerOutput::default())
}

/// Read-only: checks the case is visible, then points the caller at the export view.
pub fn export_packet(ctx: &HandlerContext<'_>, input: &Value) -> WardenResult<HandlerOutput> {
    let input: CaseRef = typed(input)?;
    let case = ctx.guard.case(&input.case_id)?;
    Ok(HandlerOutput {
        redirect: Some(format!("/app/cases/{}/export", case.id)),
    })
}
