use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use warden_core::errors::WardenResult;
use warden_core::models::{AuditEvent, ReportStatus};
use warden_storage::queries::moderation_ops;

use super::{typed, HandlerContext, HandlerOutput};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BulkResolveInput {
    report_ids: Vec<String>,
    resolution: ReportStatus,
    note: Option<String>,
}

/// Every id is checked against the tenant, in input order, before any report
/// changes. One foreign or missing id fails the whole batch.
pub fn bulk_resolve(ctx: &HandlerContext<'_>, input: &Value) -> WardenResult<HandlerOutput> {
    let input: BulkResolveInput = typed(input)?;
    for report_id in &input.report_ids {
        ctx.guard.report(report_id)?;
    }
    let changed =
        moderation_ops::bulk_update_report_status(ctx.conn, ctx.tenant_id, &input.report_ids, input.resolution)?;
    debug!(requested = input.report_ids.len(), changed, "reports resolved");

    let mut metadata = json!({
        "reportIds": input.report_ids,
        "resolution": input.resolution.as_str(),
    });
    if let Some(note) = input.note {
        metadata["note"] = json!(note);
    }
    ctx.audit(AuditEvent::ReportStatusUpdated, metadata)?;
    Ok(HandlerOutput::default())
}
