//! Property tests for the permission gate.

use std::collections::HashSet;

use proptest::prelude::*;
use warden_core::models::{Actor, Capability};
use warden_core::security::authorize;

fn capability_set() -> impl Strategy<Value = HashSet<Capability>> {
    proptest::collection::hash_set(proptest::sample::select(Capability::ALL.to_vec()), 0..12)
}

proptest! {
    /// A disabled actor is always refused, whatever it holds.
    #[test]
    fn disabled_actor_never_passes(
        caps in capability_set(),
        wanted in proptest::sample::select(Capability::ALL.to_vec()),
    ) {
        let actor = Actor {
            user_id: "u".into(),
            disabled: true,
            tenant_id: "t".into(),
            capabilities: caps,
            role_priority: 0,
            is_owner: false,
        };
        prop_assert!(authorize(&actor, wanted).is_err());
    }

    /// An enabled actor passes exactly when the capability is in its set.
    #[test]
    fn enabled_actor_passes_iff_granted(
        caps in capability_set(),
        wanted in proptest::sample::select(Capability::ALL.to_vec()),
    ) {
        let granted = caps.contains(&wanted);
        let actor = Actor {
            user_id: "u".into(),
            disabled: false,
            tenant_id: "t".into(),
            capabilities: caps,
            role_priority: 0,
            is_owner: false,
        };
        prop_assert_eq!(authorize(&actor, wanted).is_ok(), granted);
    }
}
