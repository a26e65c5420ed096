use warden_core::constants::MAX_BAN_MINUTES;
use warden_core::models::{Capability, RiskLevel};

use super::schema::{FieldKind, FieldRule, InputSchema, Rule};
use super::CommandDefinition;
use crate::handlers::{cases, moderation, reports};

const REASON_MIN: usize = 8;
const SHORT_TEXT_MIN: usize = 3;

fn player_id() -> FieldRule {
    FieldRule::required("playerId", "Player ID", Rule::Id).placeholder("player id")
}

fn reason(min: usize) -> FieldRule {
    FieldRule::required("reason", "Reason", Rule::Text { min }).kind(FieldKind::Textarea)
}

fn evidence_urls() -> FieldRule {
    FieldRule::optional("evidenceUrls", "Evidence URLs", Rule::List)
        .placeholder("one URL per line")
}

fn action_id() -> FieldRule {
    FieldRule::required("actionId", "Action ID", Rule::Id)
}

fn case_id() -> FieldRule {
    FieldRule::required("caseId", "Case ID", Rule::Id)
}

pub fn standard_definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition {
            id: "warning.create",
            name: "Create Warning",
            description: "Record a warning against a player.",
            capability: Capability::ActionsCreate,
            risk: RiskLevel::Low,
            schema: InputSchema::new(vec![player_id(), reason(REASON_MIN)]),
            handler: moderation::create_warning,
        },
        CommandDefinition {
            id: "kick.record",
            name: "Issue Kick Record",
            description: "Record a kick event (does not kick in-game).",
            capability: Capability::ActionsCreate,
            risk: RiskLevel::Low,
            schema: InputSchema::new(vec![player_id(), reason(REASON_MIN)]),
            handler: moderation::record_kick,
        },
        CommandDefinition {
            id: "ban.temp",
            name: "Temp Ban",
            description: "Record a temporary ban with duration and reason.",
            capability: Capability::BansCreate,
            risk: RiskLevel::Medium,
            schema: InputSchema::new(vec![
                player_id(),
                FieldRule::required(
                    "durationMinutes",
                    "Duration (minutes)",
                    Rule::Int {
                        min: 1,
                        max: MAX_BAN_MINUTES,
                    },
                ),
                reason(REASON_MIN),
                evidence_urls(),
            ]),
            handler: moderation::temp_ban,
        },
        CommandDefinition {
            id: "ban.perm",
            name: "Permanent Ban",
            description: "Record a permanent ban (approval required by default).",
            capability: Capability::BansCreate,
            risk: RiskLevel::High,
            schema: InputSchema::new(vec![player_id(), reason(REASON_MIN), evidence_urls()]),
            handler: moderation::perm_ban,
        },
        CommandDefinition {
            id: "ban.extend",
            name: "Extend Temp Ban",
            description: "Extend an existing temp ban action.",
            capability: Capability::BansExtend,
            risk: RiskLevel::Medium,
            schema: InputSchema::new(vec![
                action_id(),
                FieldRule::required(
                    "extraMinutes",
                    "Extra minutes",
                    Rule::Int {
                        min: 1,
                        max: MAX_BAN_MINUTES,
                    },
                ),
                reason(SHORT_TEXT_MIN),
            ]),
            handler: moderation::extend_ban,
        },
        CommandDefinition {
            id: "ban.remove",
            name: "Remove Ban",
            description: "Revoke an existing ban action (approval required by default).",
            capability: Capability::BansRemove,
            risk: RiskLevel::High,
            schema: InputSchema::new(vec![action_id(), reason(SHORT_TEXT_MIN)]),
            handler: moderation::remove_ban,
        },
        CommandDefinition {
            id: "player.flag",
            name: "Flag Player",
            description: "Set a player's status to WATCHED or ACTIVE.",
            capability: Capability::PlayersFlag,
            risk: RiskLevel::Low,
            schema: InputSchema::new(vec![
                player_id(),
                FieldRule::required("status", "Status", Rule::OneOf(&["ACTIVE", "WATCHED"])),
                FieldRule::optional("reason", "Reason", Rule::Text { min: SHORT_TEXT_MIN }),
            ]),
            handler: moderation::flag_player,
        },
        CommandDefinition {
            id: "note.add",
            name: "Add Note",
            description: "Add a moderation note to a player record.",
            capability: Capability::ActionsCreate,
            risk: RiskLevel::Low,
            schema: InputSchema::new(vec![
                player_id(),
                FieldRule::required("note", "Note", Rule::Text { min: SHORT_TEXT_MIN })
                    .kind(FieldKind::Textarea),
            ]),
            handler: moderation::add_note,
        },
        CommandDefinition {
            id: "case.from_report",
            name: "Open Case From Report",
            description: "Create a case linked to a report.",
            capability: Capability::CasesCreate,
            risk: RiskLevel::Medium,
            schema: InputSchema::new(vec![
                FieldRule::required("reportId", "Report ID", Rule::Id),
                FieldRule::optional("title", "Title", Rule::Text { min: SHORT_TEXT_MIN }),
                FieldRule::optional("assignToUserId", "Assign to user", Rule::Id),
            ]),
            handler: cases::open_from_report,
        },
        CommandDefinition {
            id: "case.assign",
            name: "Assign Case",
            description: "Assign an existing case to a staff member.",
            capability: Capability::CasesAssign,
            risk: RiskLevel::Low,
            schema: InputSchema::new(vec![
                case_id(),
                FieldRule::required("userId", "User ID", Rule::Id),
            ]),
            handler: cases::assign,
        },
        CommandDefinition {
            id: "report.bulk_resolve",
            name: "Bulk Resolve Reports",
            description: "Resolve or reject multiple reports at once.",
            capability: Capability::ReportsResolve,
            risk: RiskLevel::Medium,
            schema: InputSchema::new(vec![
                FieldRule::required(
                    "reportIds",
                    "Report IDs",
                    Rule::IdList {
                        empty_message: "Provide at least one report id.",
                    },
                )
                .placeholder("one report id per line"),
                FieldRule::required(
                    "resolution",
                    "Resolution",
                    Rule::OneOf(&["RESOLVED", "REJECTED"]),
                ),
                FieldRule::optional("note", "Note", Rule::Text { min: SHORT_TEXT_MIN })
                    .kind(FieldKind::Textarea),
            ]),
            handler: reports::bulk_resolve,
        },
        CommandDefinition {
            id: "case.export_packet",
            name: "Export Case Packet",
            description: "Open a printable export for a case.",
            capability: Capability::CasesRead,
            risk: RiskLevel::Low,
            schema: InputSchema::new(vec![case_id()]),
            handler: cases::export_packet,
        },
    ]
}
