//! Raw SQL operations. No business logic, just persistence.

pub mod approval_ops;
pub mod audit_ops;
pub mod command_ops;
pub mod identity_ops;
pub mod login_ops;
pub mod moderation_ops;
pub mod sensitive_mode_ops;
pub mod settings_ops;
pub mod signal_ops;
