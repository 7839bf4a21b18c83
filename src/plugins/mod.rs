//! Ledger subsystems: the progression ledger itself and the catalogs,
//! feature unlocks and leaderboard it is built from.

pub mod catalog;
pub mod features;
pub mod leaderboard;
pub mod ledger;
pub mod profile;
