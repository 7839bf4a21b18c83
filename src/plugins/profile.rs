//! The persisted progression record for one builder on one device.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Earn,
    Spend,
}

/// One line of credit history. Display/audit only; the balance lives in `Profile::credits`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub amount: u64,
    pub reason: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Stats {
    pub modules_created: u64,
    pub patterns_discovered: u64,
    pub consciousness_raised: u64,
    pub helpers_assisted: u64,
    pub total_actions: u64,
}

/// Named counters an action can bump. `total_actions` is maintained by the ledger itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StatCounter {
    ModulesCreated,
    PatternsDiscovered,
    ConsciousnessRaised,
    HelpersAssisted,
}

impl Stats {
    pub fn counter_mut(&mut self, counter: StatCounter) -> &mut u64 {
        match counter {
            StatCounter::ModulesCreated => &mut self.modules_created,
            StatCounter::PatternsDiscovered => &mut self.patterns_discovered,
            StatCounter::ConsciousnessRaised => &mut self.consciousness_raised,
            StatCounter::HelpersAssisted => &mut self.helpers_assisted,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub builder_id: String,
    pub xp: u64,
    pub level: u32,
    pub credits: u64,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub stats: Stats,
    #[serde(default)]
    pub credit_history: Vec<LedgerEntry>,
    #[serde(default)]
    pub purchase_history: Vec<LedgerEntry>,
    #[serde(default = "default_streak")]
    pub streak: u32,
    pub created_at: i64,
    pub last_active: i64,
}

fn default_streak() -> u32 {
    1
}

pub fn new_builder_id() -> String {
    format!("builder_{}", Ulid::new().to_string().to_lowercase())
}

impl Profile {
    /// Seed profile for a device seen for the first time.
    pub fn new(starting_credits: u64, now_ms: i64) -> Self {
        Self {
            builder_id: new_builder_id(),
            xp: 0,
            level: 1,
            credits: starting_credits,
            achievements: Vec::new(),
            stats: Stats::default(),
            credit_history: Vec::new(),
            purchase_history: Vec::new(),
            streak: 1,
            created_at: now_ms,
            last_active: now_ms,
        }
    }

    pub fn has_achievement(&self, id: &str) -> bool {
        self.achievements.iter().any(|a| a == id)
    }

    /// Earn and spend entries merged by timestamp, newest `limit` last.
    pub fn recent_entries(&self, limit: usize) -> Vec<&LedgerEntry> {
        let mut all: Vec<&LedgerEntry> = self
            .credit_history
            .iter()
            .chain(self.purchase_history.iter())
            .collect();
        all.sort_by_key(|e| e.timestamp);
        let skip = all.len().saturating_sub(limit);
        all.split_off(skip)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
