//! Change-detection tokens for signal sets.
//!
//! The digest covers the extracted signals rather than the raw page, so
//! volatile markup (ads, timestamps, CSRF tokens) never registers as a change.

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::models::SignalSet;

/// Hex SHA-256 over the canonical JSON form of `signals`.
pub fn fingerprint(signals: &SignalSet) -> String {
    let hash = Sha256::digest(canonical_bytes(signals));
    format!("{hash:x}")
}

/// Keys go through a `BTreeMap` so struct field order never reaches the digest.
fn canonical_bytes(signals: &SignalSet) -> Vec<u8> {
    let fields: BTreeMap<String, Value> = match serde_json::to_value(signals) {
        Ok(Value::Object(map)) => map.into_iter().collect(),
        _ => BTreeMap::new(),
    };
    serde_json::to_vec(&fields).unwrap_or_default()
}
