// Single source of truth for all default values.

// --- Storage ---
pub const DEFAULT_DB_FILENAME: &str = "warden.db";
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5_000;
pub const DEFAULT_READ_POOL_SIZE: usize = 4;

// --- Security policy ---
pub const DEFAULT_TWO_PERSON_RULE: bool = true;
pub const DEFAULT_REQUIRE_SENSITIVE_MODE: bool = true;
pub const DEFAULT_SENSITIVE_MODE_TTL_MINUTES: i64 = 10;
pub const DEFAULT_HIGH_RISK_COOLDOWN_SECS: i64 = 60;
pub const DEFAULT_AUTO_FREEZE_ENABLED: bool = false;
pub const DEFAULT_LOCKOUT_MAX_ATTEMPTS: i64 = 5;
pub const DEFAULT_LOCKOUT_WINDOW_MINUTES: i64 = 15;
pub const DEFAULT_LOCKOUT_DURATION_MINUTES: i64 = 15;

// --- Signals ---
pub const DEFAULT_SIGNAL_WINDOW_MINUTES: i64 = 10;
pub const DEFAULT_HIGH_RISK_BURST_THRESHOLD: i64 = 3;
pub const DEFAULT_HIGH_RISK_BURST_CRITICAL: i64 = 6;
pub const DEFAULT_APPROVAL_SPAM_THRESHOLD: i64 = 5;
pub const DEFAULT_LOGIN_BURST_THRESHOLD: i64 = 5;

// --- Audit ---
pub const DEFAULT_AUDIT_ERROR_LOG_INTERVAL_SECS: u64 = 10;

// --- Circuit breaker ---
pub const DEFAULT_BREAKER_OPEN_SECS: i64 = 10;

// --- Login throttle ---
pub const DEFAULT_LOGIN_RATE_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_LOGIN_RATE_WINDOW_MINUTES: i64 = 15;

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
