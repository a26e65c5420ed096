use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use warden_core::models::AuditLogEntry;

use crate::fmt_ts;

/// Serialize `value` with object keys sorted at every depth.
///
/// Independent of serde_json's map ordering features, so the hash of a stored
/// entry never depends on how the workspace happens to be compiled.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                if let Some(v) = map.get(key) {
                    write_canonical(v, out);
                }
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn opt(value: &Option<String>) -> Value {
    value.clone().map(Value::String).unwrap_or(Value::Null)
}

/// `sha256_hex(prev_hash_or_empty + canonical_json(fields))` over every
/// persisted field except the hashes themselves.
///
/// The tenant is hashed under `communityId` and the actor under `userId`.
/// Stored chains depend on these names.
pub fn compute_entry_hash(entry: &AuditLogEntry) -> String {
    let mut fields = Map::new();
    fields.insert("chainIndex".into(), Value::from(entry.chain_index));
    fields.insert("communityId".into(), opt(&entry.tenant_id));
    fields.insert("createdAt".into(), Value::String(fmt_ts(&entry.created_at)));
    fields.insert("eventType".into(), Value::String(entry.event_type.clone()));
    fields.insert("ip".into(), opt(&entry.ip));
    fields.insert("metadata".into(), entry.metadata.clone());
    fields.insert("userAgent".into(), opt(&entry.user_agent));
    fields.insert("userId".into(), opt(&entry.actor_id));

    let mut hasher = Sha256::new();
    hasher.update(entry.prev_hash.as_deref().unwrap_or("").as_bytes());
    hasher.update(canonical_json(&Value::Object(fields)).as_bytes());
    hex::encode(hasher.finalize())
}
