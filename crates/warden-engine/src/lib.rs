//! # warden-engine
//!
//! Turns a validated moderation intent into an authorized, optionally
//! two-person-approved, atomically applied state change, with every step
//! recorded in the audit chain.
//!
//! [`CommandEngine`] is the entry point; the other modules are the pieces it
//! orchestrates.

pub mod actor;
pub mod approval;
pub mod catalog;
pub mod context;
pub mod engine;
pub mod execution;
pub mod handlers;
pub mod login;
pub mod sensitive_mode;
pub mod settings;
pub mod signals;
pub mod tenant_guard;
pub mod tracing_setup;

pub use approval::{DecisionOutcome, DecisionRequest};
pub use catalog::{CommandCatalog, CommandDefinition};
pub use context::{ClientInfo, EngineContext};
pub use engine::{CommandEngine, CommandOutcome, CommandRequest};
pub use login::{LoginGate, LoginGuard, RateLimiter};
pub use sensitive_mode::SensitiveModeService;
