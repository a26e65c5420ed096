mod storage_error;
mod warden_error;

pub use storage_error::StorageError;
pub use warden_error::{CooldownKind, WardenError};

/// Convenience alias used throughout the workspace.
pub type WardenResult<T> = Result<T, WardenError>;
