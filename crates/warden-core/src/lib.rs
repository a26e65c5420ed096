//! # warden-core
//!
//! Foundation crate for the Warden command engine.
//! Defines models, errors, config, constants, the clock abstraction and the
//! permission gate. Every other crate in the workspace depends on this.

pub mod clock;
pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod security;

// Re-export the most commonly used types at the crate root.
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::WardenConfig;
pub use errors::{StorageError, WardenError, WardenResult};
pub use models::{Actor, Capability, RiskLevel, SecuritySettings};
