use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::Capability;

/// The identity invoking an operation, resolved fresh for each call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    pub disabled: bool,
    /// The tenant the actor is acting in.
    pub tenant_id: String,
    pub capabilities: HashSet<Capability>,
    /// Higher numbers outrank lower ones.
    pub role_priority: i64,
    /// Holds the owner role of the tenant.
    pub is_owner: bool,
}

impl Actor {
    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}
