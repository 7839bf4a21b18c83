//! Subsystem registration: schema descriptors for every CLI-facing surface.
//!
//! Adding a new subsystem: append one entry to `SUBSYSTEMS`.

use crate::core::broker;
use crate::plugins::{catalog, features, leaderboard, ledger};

pub(crate) struct Subsystem {
    pub name: &'static str,
    pub schema: fn() -> serde_json::Value,
}

pub(crate) const SUBSYSTEMS: &[Subsystem] = &[
    Subsystem { name: "ledger", schema: ledger::schema },
    Subsystem { name: "catalog", schema: catalog::schema },
    Subsystem { name: "leaderboard", schema: leaderboard::schema },
    Subsystem { name: "features", schema: features::schema },
    Subsystem { name: "broker", schema: broker::schema },
];

/// All subsystem schemas, in registration order.
pub(crate) fn all_schemas() -> Vec<serde_json::Value> {
    SUBSYSTEMS.iter().map(|s| (s.schema)()).collect()
}
