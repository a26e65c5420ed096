use crate::models::Capability;

/// Built-in role ladder. Each template includes every capability of the one below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleTemplate {
    Viewer,
    TrialMod,
    Mod,
    Admin,
    Owner,
}

impl RoleTemplate {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Viewer => "Viewer",
            Self::TrialMod => "Trial Moderator",
            Self::Mod => "Moderator",
            Self::Admin => "Admin",
            Self::Owner => "Owner",
        }
    }

    pub fn priority(&self) -> i64 {
        match self {
            Self::Viewer => 10,
            Self::TrialMod => 20,
            Self::Mod => 30,
            Self::Admin => 40,
            Self::Owner => 100,
        }
    }

    pub fn capabilities(&self) -> Vec<Capability> {
        use Capability::*;
        match self {
            Self::Viewer => vec![PlayersRead, CasesRead, ReportsRead],
            Self::TrialMod => {
                let mut caps = Self::Viewer.capabilities();
                caps.extend([
                    PlayersEdit,
                    ActionsCreate,
                    BansCreate,
                    ReportsTriage,
                    CasesComment,
                    CommandsRun,
                    ViewsManage,
                    DispatchRead,
                ]);
                caps
            }
            Self::Mod => {
                let mut caps = Self::TrialMod.capabilities();
                caps.extend([
                    PlayersFlag,
                    CasesCreate,
                    CasesAssign,
                    ReportsResolve,
                    BansExtend,
                    DispatchManage,
                    MapManageLayers,
                ]);
                caps
            }
            Self::Admin => {
                let mut caps = Self::Mod.capabilities();
                caps.extend([
                    UsersRead,
                    UsersInvite,
                    UsersEditRole,
                    ActionsRevoke,
                    BansRemove,
                    AuditRead,
                    SecurityRead,
                    SettingsEdit,
                    CommandsManage,
                    ApprovalsDecide,
                ]);
                caps
            }
            Self::Owner => {
                let mut caps = Self::Admin.capabilities();
                caps.extend([UsersDisable, ApiKeysManage]);
                caps
            }
        }
    }
}
