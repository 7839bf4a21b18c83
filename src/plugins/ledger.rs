//! The progression ledger: the only writer of a builder's profile.
//!
//! Every mutation runs to completion, persists the profile through the
//! [`KvStore`] and publishes a [`LedgerEvent::ProfileUpdated`] snapshot
//! before returning. Composite operations (`reward_action`,
//! `check_achievements`, `start_session`) are sequences of those steps and
//! are not jointly atomic: a failure half way leaves the earlier steps
//! committed.

use crate::core::config::LedgerConfig;
use crate::core::error::LedgerError;
use crate::core::events::{EventBus, LedgerEvent};
use crate::core::store::KvStore;
use crate::core::time::{self, Clock};
use crate::plugins::catalog::{self, ACHIEVEMENTS, Achievement};
use crate::plugins::features;
use crate::plugins::leaderboard;
use crate::plugins::profile::{EntryKind, LedgerEntry, Profile};
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::sync::mpsc::Receiver;
use tracing::{debug, info, warn};

/// Result of a single `add_xp` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XpAward {
    pub awarded: u64,
    pub did_level_up: bool,
    pub new_level: Option<u32>,
    /// Every level reached by this call, lowest first.
    pub levels_crossed: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
    pub action: String,
    pub xp: XpAward,
    pub credits_awarded: u64,
    pub balance: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    pub days_away: i64,
    pub daily_reward: bool,
    pub streak: u32,
    pub streak_bonus: bool,
    pub streak_reset: bool,
}

pub struct Ledger<S: KvStore> {
    kv: S,
    config: LedgerConfig,
    clock: Box<dyn Clock>,
    profile: Profile,
    bus: EventBus,
}

impl<S: KvStore> Ledger<S> {
    /// Load the device profile, creating and persisting a seed profile on first use.
    ///
    /// A stored blob that does not parse is replaced with a fresh profile; the
    /// corruption is logged and never returned as an error.
    pub fn open(
        mut kv: S,
        config: LedgerConfig,
        clock: impl Clock + 'static,
    ) -> Result<Self, LedgerError> {
        let key = config.profile_key();
        let now = clock.now_millis();

        let loaded = match kv.get(&key)? {
            None => None,
            Some(raw) => match Profile::from_json(&raw) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    warn!(key = %key, error = %e, "stored profile is malformed; starting a fresh profile");
                    None
                }
            },
        };

        let profile = match loaded {
            Some(mut profile) => {
                let derived = catalog::level_for_xp(profile.xp);
                if profile.level != derived {
                    warn!(
                        stored = profile.level,
                        derived, "cached level disagrees with xp; using derived level"
                    );
                    profile.level = derived;
                    kv.set(&key, &profile.to_json()?)?;
                }
                profile
            }
            None => {
                let profile = Profile::new(config.starting_credits, now);
                info!(builder_id = %profile.builder_id, "created new builder profile");
                kv.set(&key, &profile.to_json()?)?;
                profile
            }
        };

        Ok(Self {
            kv,
            config,
            clock: Box::new(clock),
            profile,
            bus: EventBus::new(),
        })
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.kv
    }

    pub fn into_store(self) -> S {
        self.kv
    }

    /// Receive every event published after this call.
    pub fn subscribe(&mut self) -> Receiver<LedgerEvent> {
        self.bus.subscribe()
    }

    fn persist(&mut self) -> Result<(), LedgerError> {
        self.kv
            .set(&self.config.profile_key(), &self.profile.to_json()?)?;
        self.bus
            .publish(LedgerEvent::ProfileUpdated(self.profile.clone()));
        Ok(())
    }

    fn entry(&self, kind: EntryKind, amount: u64, reason: &str) -> LedgerEntry {
        LedgerEntry {
            kind,
            amount,
            reason: reason.to_string(),
            timestamp: self.clock.now_millis(),
        }
    }

    fn add_credits(&mut self, amount: u64) -> Result<u64, LedgerError> {
        let credits = self.profile.credits.checked_add(amount).ok_or_else(|| {
            LedgerError::ValidationError(format!(
                "credit grant of {} overflows balance {}",
                amount, self.profile.credits
            ))
        })?;
        self.profile.credits = credits;
        Ok(credits)
    }

    /// Add xp, then climb every level boundary the new total crosses.
    ///
    /// The new xp and the credits of every crossed level are checked for
    /// overflow before anything is written; a rejected grant leaves the
    /// profile untouched.
    pub fn add_xp(&mut self, amount: u64, reason: &str) -> Result<XpAward, LedgerError> {
        let xp = self.profile.xp.checked_add(amount).ok_or_else(|| {
            LedgerError::ValidationError(format!(
                "xp grant of {} overflows total {}",
                amount, self.profile.xp
            ))
        })?;

        let mut levels_crossed = Vec::new();
        let mut credits = self.profile.credits;
        let mut level = self.profile.level;
        loop {
            let next = level.saturating_add(1);
            let threshold = catalog::xp_for_level(next);
            if next == level || threshold == u64::MAX || xp < threshold {
                break;
            }
            let reward = catalog::level_reward(next);
            credits = credits.checked_add(reward.credits).ok_or_else(|| {
                LedgerError::ValidationError(format!(
                    "level {} reward of {} credits overflows balance {}",
                    next, reward.credits, credits
                ))
            })?;
            level = next;
            levels_crossed.push(next);
        }

        self.profile.xp = xp;
        self.profile.level = level;
        self.profile.credits = credits;
        self.profile.stats.total_actions = self.profile.stats.total_actions.saturating_add(1);
        debug!(amount, reason, xp, "xp added");

        for level in &levels_crossed {
            self.apply_level_reward(*level)?;
        }

        self.persist()?;
        Ok(XpAward {
            awarded: amount,
            did_level_up: !levels_crossed.is_empty(),
            new_level: levels_crossed.last().copied(),
            levels_crossed,
        })
    }

    /// History, unlocks and notification for a level whose credits are already on the balance.
    fn apply_level_reward(&mut self, level: u32) -> Result<(), LedgerError> {
        let reward = catalog::level_reward(level);
        let entry = self.entry(EntryKind::Earn, reward.credits, &format!("Level {} reward", level));
        self.profile.credit_history.push(entry);

        let features_key = self.config.features_key();
        let added = features::unlock_features(&mut self.kv, &features_key, reward.unlocks)?;
        info!(level, credits = reward.credits, unlocked = ?added, "level up");

        self.bus.publish(LedgerEvent::LevelUp { level, reward });
        Ok(())
    }

    /// Add credits and record the grant. Returns the new balance.
    pub fn earn_credits(&mut self, amount: u64, reason: &str) -> Result<u64, LedgerError> {
        let balance = self.add_credits(amount)?;
        let entry = self.entry(EntryKind::Earn, amount, reason);
        self.profile.credit_history.push(entry);
        self.persist()?;
        Ok(balance)
    }

    /// Spend credits, failing with `InsufficientFunds` and no mutation when the balance is short.
    /// Returns the new balance.
    pub fn try_spend_credits(&mut self, amount: u64, item: &str) -> Result<u64, LedgerError> {
        let available = self.profile.credits;
        if available < amount {
            debug!(amount, available, item, "purchase rejected");
            self.bus.publish(LedgerEvent::PurchaseRejected {
                item: item.to_string(),
                needed: amount,
                available,
            });
            return Err(LedgerError::InsufficientFunds {
                needed: amount,
                available,
            });
        }
        self.profile.credits = available - amount;
        let entry = self.entry(EntryKind::Spend, amount, item);
        self.profile.purchase_history.push(entry);
        self.persist()?;
        Ok(self.profile.credits)
    }

    /// `true` when the purchase went through, `false` when the balance was too low.
    pub fn spend_credits(&mut self, amount: u64, item: &str) -> Result<bool, LedgerError> {
        match self.try_spend_credits(amount, item) {
            Ok(_) => Ok(true),
            Err(LedgerError::InsufficientFunds { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Grant the tabled reward for `action`. Unknown actions are ignored and return `None`.
    pub fn reward_action(&mut self, action: &str) -> Result<Option<ActionOutcome>, LedgerError> {
        let Some(reward) = catalog::action_reward(action) else {
            debug!(action, "ignoring unknown action type");
            return Ok(None);
        };

        let xp = self.add_xp(reward.xp, action)?;
        let balance = self.earn_credits(reward.credits, action)?;
        if let Some(stat) = reward.stat {
            let counter = self.profile.stats.counter_mut(stat);
            *counter = counter.saturating_add(1);
        }
        self.persist()?;

        Ok(Some(ActionOutcome {
            action: action.to_string(),
            xp,
            credits_awarded: reward.credits,
            balance,
        }))
    }

    /// Unlock every catalog achievement whose predicate holds and grant its reward.
    ///
    /// Predicates read the live profile, so a reward can satisfy a later entry
    /// in the same pass. Passes repeat until one unlocks nothing, which also
    /// catches earlier entries satisfied by a later entry's reward; an
    /// immediate second call therefore returns an empty list.
    pub fn check_achievements(&mut self) -> Result<Vec<&'static Achievement>, LedgerError> {
        let mut unlocked: FxHashSet<&str> = FxHashSet::default();
        for id in &self.profile.achievements {
            if let Some(known) = catalog::achievement(id) {
                unlocked.insert(known.id);
            }
        }

        let mut newly = Vec::new();
        loop {
            let before = newly.len();
            for achievement in ACHIEVEMENTS {
                if unlocked.contains(achievement.id) || !(achievement.unlocked_when)(&self.profile) {
                    continue;
                }
                unlocked.insert(achievement.id);
                self.profile.achievements.push(achievement.id.to_string());
                self.persist()?;
                info!(id = achievement.id, "achievement unlocked");
                self.bus.publish(LedgerEvent::AchievementUnlocked {
                    id: achievement.id.to_string(),
                    name: achievement.name.to_string(),
                });

                let reason = format!("Achievement: {}", achievement.name);
                if achievement.xp_reward > 0 {
                    self.add_xp(achievement.xp_reward, &reason)?;
                }
                if achievement.credit_reward > 0 {
                    self.earn_credits(achievement.credit_reward, &reason)?;
                }
                newly.push(achievement);
            }
            if newly.len() == before {
                break;
            }
        }
        Ok(newly)
    }

    /// Session-start bookkeeping: daily login reward and streak maintenance.
    pub fn start_session(&mut self) -> Result<SessionReport, LedgerError> {
        let now = self.clock.now_millis();
        let days_away = time::whole_days_between(self.profile.last_active, now);

        let mut report = SessionReport {
            days_away,
            daily_reward: false,
            streak: self.profile.streak,
            streak_bonus: false,
            streak_reset: false,
        };

        if days_away >= 1 {
            self.reward_action("daily_login")?;
            report.daily_reward = true;
            if days_away == 1 {
                self.profile.streak = self.profile.streak.saturating_add(1);
                if self.profile.streak % 7 == 0 {
                    self.reward_action("streak_bonus")?;
                    report.streak_bonus = true;
                }
            } else {
                self.profile.streak = 1;
                report.streak_reset = true;
            }
        }

        self.profile.last_active = now;
        self.persist()?;
        report.streak = self.profile.streak;
        Ok(report)
    }

    pub fn xp_for_level(&self, level: u32) -> u64 {
        catalog::xp_for_level(level)
    }

    /// Fraction of the way from the current level's threshold to the next one.
    pub fn level_progress(&self) -> f64 {
        let floor = if self.profile.level <= 1 {
            0
        } else {
            catalog::xp_for_level(self.profile.level)
        };
        let ceiling = catalog::xp_for_level(self.profile.level.saturating_add(1));
        if ceiling <= floor {
            return 1.0;
        }
        (self.profile.xp.saturating_sub(floor)) as f64 / (ceiling - floor) as f64
    }

    pub fn xp_to_next_level(&self) -> u64 {
        catalog::xp_for_level(self.profile.level.saturating_add(1)).saturating_sub(self.profile.xp)
    }

    /// This builder's 1-based position among every profile in the store.
    pub fn leaderboard_rank(&self) -> Result<Option<usize>, LedgerError> {
        leaderboard::leaderboard_rank(&self.kv, &self.profile.builder_id)
    }

    pub fn unlocked_features(&self) -> Result<features::FeatureMap, LedgerError> {
        features::load_features(&self.kv, &self.config.features_key())
    }
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "ledger",
        "version": "0.1.0",
        "description": "Builder progression: xp, levels, credits, streaks and achievements",
        "commands": [
            { "name": "status", "description": "Show the current profile", "parameters": ["format"] },
            { "name": "session", "description": "Run the daily login and streak check" },
            { "name": "xp add", "parameters": ["amount", "reason"] },
            { "name": "credits earn", "parameters": ["amount", "reason"] },
            { "name": "credits spend", "parameters": ["amount", "item"] },
            { "name": "credits balance" },
            { "name": "reward", "parameters": ["action"] },
            { "name": "achievements check" },
            { "name": "achievements list" },
            { "name": "history", "parameters": ["limit"] }
        ],
        "storage": ["ledger.db"]
    })
}
