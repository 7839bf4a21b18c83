use crate::core::config::PROFILE_KEY_PREFIX;
use crate::core::error::LedgerError;
use crate::core::store::KvStore;
use crate::plugins::catalog;
use crate::plugins::profile::Profile;
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub device: String,
    pub builder_id: String,
    pub xp: u64,
    pub level: u32,
    pub title: String,
}

/// Every parseable profile in the store, in key order. Malformed blobs are skipped.
pub fn load_all_profiles<S: KvStore + ?Sized>(
    kv: &S,
) -> Result<Vec<(String, Profile)>, LedgerError> {
    let mut out = Vec::new();
    for key in kv.keys(PROFILE_KEY_PREFIX)? {
        let Some(raw) = kv.get(&key)? else {
            continue;
        };
        match Profile::from_json(&raw) {
            Ok(profile) => {
                let device = key.strip_prefix(PROFILE_KEY_PREFIX).unwrap_or(&key).to_string();
                out.push((device, profile));
            }
            Err(e) => warn!(key = %key, error = %e, "skipping malformed profile"),
        }
    }
    Ok(out)
}

/// Profiles ranked by xp, highest first. Equal xp keeps storage key order.
pub fn leaderboard<S: KvStore + ?Sized>(kv: &S) -> Result<Vec<LeaderboardEntry>, LedgerError> {
    let mut profiles = load_all_profiles(kv)?;
    profiles.sort_by(|a, b| b.1.xp.cmp(&a.1.xp));
    Ok(profiles
        .into_iter()
        .enumerate()
        .map(|(i, (device, p))| LeaderboardEntry {
            rank: i + 1,
            device,
            builder_id: p.builder_id,
            xp: p.xp,
            level: p.level,
            title: catalog::title_for_level(p.level).to_string(),
        })
        .collect())
}

pub fn leaderboard_rank<S: KvStore + ?Sized>(
    kv: &S,
    builder_id: &str,
) -> Result<Option<usize>, LedgerError> {
    Ok(leaderboard(kv)?
        .into_iter()
        .find(|e| e.builder_id == builder_id)
        .map(|e| e.rank))
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "leaderboard",
        "version": "0.1.0",
        "description": "Rank every stored builder profile by xp",
        "commands": [
            { "name": "leaderboard", "parameters": ["limit", "format"] }
        ],
        "storage": ["ledger.db"]
    })
}
