//! Prompt normalization and hashing for the response cache key.

use sha2::{Digest, Sha256};

pub const CACHE_KEY_PREFIX: &str = "chat:v1:";

/// Lowercases, keeps only `[a-z0-9 ]`, collapses whitespace runs and trims.
pub fn normalize(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    let mut pending_space = false;
    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if !(ch.is_ascii_lowercase() || ch.is_ascii_digit()) {
            continue;
        }
        if pending_space && !normalized.is_empty() {
            normalized.push(' ');
        }
        pending_space = false;
        normalized.push(ch);
    }
    normalized
}

/// Hex-encoded SHA-256 of an already normalized string.
pub fn hash(normalized: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn cache_key(prompt: &str) -> String {
    format!("{CACHE_KEY_PREFIX}{}", hash(&normalize(prompt)))
}
