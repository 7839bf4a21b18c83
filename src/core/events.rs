//! Change notifications published by the ledger.
//!
//! Presentation layers subscribe and receive every event over an mpsc
//! channel. The ledger never knows who is listening; subscribers whose
//! receiver was dropped are pruned on the next publish.

use crate::plugins::catalog::LevelReward;
use crate::plugins::profile::Profile;
use serde::Serialize;
use std::sync::mpsc::{self, Receiver, Sender};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// Full snapshot after a committed mutation.
    ProfileUpdated(Profile),
    LevelUp { level: u32, reward: LevelReward },
    AchievementUnlocked { id: String, name: String },
    PurchaseRejected { item: String, needed: u64, available: u64 },
}

#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<Sender<LedgerEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<LedgerEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn publish(&mut self, event: LedgerEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
