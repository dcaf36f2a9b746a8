//! BLAKE3 hashing for descriptors and deterministic identifiers.

use crate::core::types::ResourceDescriptor;

/// Hash a string. Returns `"blake3:{hex}"`.
pub fn hash_string(s: &str) -> String {
    format!("blake3:{}", blake3::hash(s.as_bytes()).to_hex())
}

/// Hash the unresolved descriptor. Refs hash as their path, so a change in
/// an upstream output does not by itself change this hash.
pub fn hash_descriptor(descriptor: &ResourceDescriptor) -> String {
    let canonical = serde_json::Value::Object(descriptor.to_object()).to_string();
    hash_string(&canonical)
}

/// Deterministic short hex id derived from the components, `len` hex chars
/// (capped at 64).
pub fn short_id(components: &[&str], len: usize) -> String {
    let mut hasher = blake3::Hasher::new();
    for c in components {
        hasher.update(c.as_bytes());
        hasher.update(b"\0");
    }
    let hex = hasher.finalize().to_hex();
    hex[..len.min(hex.len())].to_string()
}
