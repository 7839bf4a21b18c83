//! Per-device map of unlocked features to their lifecycle stage.
//!
//! Level-up rewards add entries here. Adding a feature that is already
//! present keeps its existing stage.

use crate::core::error::LedgerError;
use crate::core::store::KvStore;
use std::collections::BTreeMap;
use tracing::warn;

pub const STAGE_UNLOCKED: &str = "unlocked";

pub type FeatureMap = BTreeMap<String, String>;

pub fn load_features<S: KvStore + ?Sized>(kv: &S, key: &str) -> Result<FeatureMap, LedgerError> {
    let Some(raw) = kv.get(key)? else {
        return Ok(FeatureMap::new());
    };
    match serde_json::from_str(&raw) {
        Ok(map) => Ok(map),
        Err(e) => {
            warn!(key, error = %e, "unlocked features blob is malformed; starting empty");
            Ok(FeatureMap::new())
        }
    }
}

/// Insert each missing feature with the `unlocked` stage and persist if anything changed.
/// Returns the features that were newly added.
pub fn unlock_features<S: KvStore + ?Sized>(
    kv: &mut S,
    key: &str,
    features: &[&str],
) -> Result<Vec<String>, LedgerError> {
    let mut map = load_features(&*kv, key)?;
    let mut added = Vec::new();
    for feature in features {
        if !map.contains_key(*feature) {
            map.insert(feature.to_string(), STAGE_UNLOCKED.to_string());
            added.push(feature.to_string());
        }
    }
    if !added.is_empty() {
        kv.set(key, &serde_json::to_string(&map)?)?;
    }
    Ok(added)
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "features",
        "version": "0.1.0",
        "description": "Feature unlocks granted by level-up rewards",
        "commands": [
            { "name": "features", "description": "List unlocked features and their stage" }
        ],
        "storage": ["features:<device>"]
    })
}
