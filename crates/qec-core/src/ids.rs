//! Identifier derivation for analysis runs.

use chrono::{DateTime, Utc};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// `qec-<unix-seconds>-<4-digit hash of the LSU>`.
pub fn analysis_id(lsu: &str, at: DateTime<Utc>) -> String {
    let mut hasher = DefaultHasher::new();
    lsu.hash(&mut hasher);
    format!("qec-{}-{:04}", at.timestamp(), hasher.finish() % 10_000)
}

pub fn audit_trail_id(analysis_id: &str) -> String {
    format!("audit-{}", analysis_id)
}
