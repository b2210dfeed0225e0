//! Opaque identifiers for environments, fires, and runs.

use uuid::Uuid;

/// `<prefix>-<10 hex of BLAKE3(payload)>-<6 random hex>`.
///
/// The hash part groups identical definitions; the random suffix keeps every
/// submission distinct.
pub fn content_id(prefix: &str, payload: &serde_json::Value) -> String {
    // serde_json maps are ordered by key, so this encoding is canonical.
    let canonical = payload.to_string();
    let hash = blake3::hash(canonical.as_bytes()).to_hex();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", prefix, &hash[..10], &suffix[..6])
}

pub fn run_id() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("run-{}", &raw[..8])
}

/// Identifiers are used as file names, so only `[A-Za-z0-9_-]` is accepted.
pub fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
