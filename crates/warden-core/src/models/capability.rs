use serde::{Deserialize, Serialize};

/// A single permission string granted through a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Capability {
    #[serde(rename = "users:read")]
    UsersRead,
    #[serde(rename = "users:invite")]
    UsersInvite,
    #[serde(rename = "users:edit_role")]
    UsersEditRole,
    #[serde(rename = "users:disable")]
    UsersDisable,
    #[serde(rename = "players:read")]
    PlayersRead,
    #[serde(rename = "players:edit")]
    PlayersEdit,
    #[serde(rename = "players:flag")]
    PlayersFlag,
    #[serde(rename = "actions:create")]
    ActionsCreate,
    #[serde(rename = "actions:revoke")]
    ActionsRevoke,
    #[serde(rename = "actions:edit_reason")]
    ActionsEditReason,
    #[serde(rename = "bans:create")]
    BansCreate,
    #[serde(rename = "bans:extend")]
    BansExtend,
    #[serde(rename = "bans:remove")]
    BansRemove,
    #[serde(rename = "cases:read")]
    CasesRead,
    #[serde(rename = "cases:create")]
    CasesCreate,
    #[serde(rename = "cases:assign")]
    CasesAssign,
    #[serde(rename = "cases:close")]
    CasesClose,
    #[serde(rename = "cases:comment")]
    CasesComment,
    #[serde(rename = "reports:read")]
    ReportsRead,
    #[serde(rename = "reports:triage")]
    ReportsTriage,
    #[serde(rename = "reports:resolve")]
    ReportsResolve,
    #[serde(rename = "audit:read")]
    AuditRead,
    #[serde(rename = "security:read")]
    SecurityRead,
    #[serde(rename = "settings:edit")]
    SettingsEdit,
    #[serde(rename = "commands:run")]
    CommandsRun,
    #[serde(rename = "commands:manage")]
    CommandsManage,
    #[serde(rename = "approvals:decide")]
    ApprovalsDecide,
    #[serde(rename = "views:manage")]
    ViewsManage,
    #[serde(rename = "api_keys:manage")]
    ApiKeysManage,
    #[serde(rename = "dispatch:read")]
    DispatchRead,
    #[serde(rename = "dispatch:manage")]
    DispatchManage,
    #[serde(rename = "map:manage_layers")]
    MapManageLayers,
}

impl Capability {
    pub const ALL: [Capability; 32] = [
        Self::UsersRead,
        Self::UsersInvite,
        Self::UsersEditRole,
        Self::UsersDisable,
        Self::PlayersRead,
        Self::PlayersEdit,
        Self::PlayersFlag,
        Self::ActionsCreate,
        Self::ActionsRevoke,
        Self::ActionsEditReason,
        Self::BansCreate,
        Self::BansExtend,
        Self::BansRemove,
        Self::CasesRead,
        Self::CasesCreate,
        Self::CasesAssign,
        Self::CasesClose,
        Self::CasesComment,
        Self::ReportsRead,
        Self::ReportsTriage,
        Self::ReportsResolve,
        Self::AuditRead,
        Self::SecurityRead,
        Self::SettingsEdit,
        Self::CommandsRun,
        Self::CommandsManage,
        Self::ApprovalsDecide,
        Self::ViewsManage,
        Self::ApiKeysManage,
        Self::DispatchRead,
        Self::DispatchManage,
        Self::MapManageLayers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UsersRead => "users:read",
            Self::UsersInvite => "users:invite",
            Self::UsersEditRole => "users:edit_role",
            Self::UsersDisable => "users:disable",
            Self::PlayersRead => "players:read",
            Self::PlayersEdit => "players:edit",
            Self::PlayersFlag => "players:flag",
            Self::ActionsCreate => "actions:create",
            Self::ActionsRevoke => "actions:revoke",
            Self::ActionsEditReason => "actions:edit_reason",
            Self::BansCreate => "bans:create",
            Self::BansExtend => "bans:extend",
            Self::BansRemove => "bans:remove",
            Self::CasesRead => "cases:read",
            Self::CasesCreate => "cases:create",
            Self::CasesAssign => "cases:assign",
            Self::CasesClose => "cases:close",
            Self::CasesComment => "cases:comment",
            Self::ReportsRead => "reports:read",
            Self::ReportsTriage => "reports:triage",
            Self::ReportsResolve => "reports:resolve",
            Self::AuditRead => "audit:read",
            Self::SecurityRead => "security:read",
            Self::SettingsEdit => "settings:edit",
            Self::CommandsRun => "commands:run",
            Self::CommandsManage => "commands:manage",
            Self::ApprovalsDecide => "approvals:decide",
            Self::ViewsManage => "views:manage",
            Self::ApiKeysManage => "api_keys:manage",
            Self::DispatchRead => "dispatch:read",
            Self::DispatchManage => "dispatch:manage",
            Self::MapManageLayers => "map:manage_layers",
        }
    }

    /// Parse a stored permission string. Unknown strings yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == s)
    }
}
