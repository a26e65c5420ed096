use crate::errors::{WardenError, WardenResult};
use crate::models::{Actor, Capability};

/// Check that `actor` may exercise `capability`. Pure; no side effects.
///
/// A disabled account is rejected before its capabilities are consulted.
pub fn authorize(actor: &Actor, capability: Capability) -> WardenResult<()> {
    if actor.disabled {
        return Err(WardenError::forbidden("Account disabled."));
    }
    if !actor.has(capability) {
        return Err(WardenError::forbidden("Insufficient permissions."));
    }
    Ok(())
}
