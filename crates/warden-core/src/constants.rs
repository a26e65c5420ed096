/// Warden system version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Upper bound for ban durations and extensions, in minutes (30 days).
pub const MAX_BAN_MINUTES: i64 = 43_200;

/// Maximum length of a resource identifier accepted by command input.
pub const MAX_ID_LEN: usize = 64;

/// Case titles derived from a report summary are cut to this many characters.
pub const CASE_TITLE_FROM_SUMMARY_LEN: usize = 72;

/// Maximum number of pending approvals returned by the inbox listing.
pub const PENDING_APPROVALS_LIMIT: usize = 50;

/// Settings key under which per-tenant security policy is stored.
pub const SECURITY_SETTINGS_KEY: &str = "security";

/// Security signal event types.
pub const SIGNAL_CROSS_TENANT: &str = "cross_tenant_access_attempt";
pub const SIGNAL_HIGH_RISK_BURST: &str = "high_risk_command_burst";
pub const SIGNAL_APPROVAL_SPAM: &str = "approval_spam";
pub const SIGNAL_LOGIN_BURST: &str = "login_failed_burst";

/// Payload kind for approvals that gate a catalog command.
pub const PAYLOAD_KIND_COMMAND: &str = "command";

/// Payload kind for approvals that gate a community join.
pub const PAYLOAD_KIND_INVITE_JOIN: &str = "invite.join";
