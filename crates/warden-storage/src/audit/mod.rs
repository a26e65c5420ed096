//! Hash-chained, append-only audit log.
//!
//! Every entry carries the hash of its predecessor, so any edit, deletion or
//! reordering of stored rows is detectable by [`verify`].

mod hash;
mod verify;
mod writer;

pub use hash::{canonical_json, compute_entry_hash};
pub use verify::{verify, verify_stored_chain, ChainVerification};
pub use writer::{AuditChainWriter, AuditMode};
