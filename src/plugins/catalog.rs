//! Static reward catalogs: level thresholds, level rewards, action rewards, achievements.
//!
//! Everything here is compiled in and never mutated at runtime.

use crate::plugins::profile::{Profile, StatCounter};
use serde::Serialize;

/// Minimum xp required to hold `level`: `floor(level^2.5 * 100)`.
///
/// Computed as `isqrt(10_000 * level^5)`, which is the same quantity without
/// floating point error at perfect powers (level 4 is exactly 3200).
/// Saturates at `u64::MAX` for levels far beyond any reachable xp.
pub fn xp_for_level(level: u32) -> u64 {
    let l = level as u128;
    let scaled = l
        .checked_pow(5)
        .and_then(|p| p.checked_mul(10_000));
    match scaled {
        Some(v) => u64::try_from(v.isqrt()).unwrap_or(u64::MAX),
        None => u64::MAX,
    }
}

/// Highest level whose threshold `xp` meets. Level 1 is the floor.
pub fn level_for_xp(xp: u64) -> u32 {
    let mut level = 1u32;
    while level < u32::MAX {
        let next = xp_for_level(level + 1);
        if xp < next || next == u64::MAX {
            break;
        }
        level += 1;
    }
    level
}

pub fn title_for_level(level: u32) -> &'static str {
    match level {
        0..=4 => "Novice Builder",
        5..=9 => "Apprentice Builder",
        10..=19 => "Journeyman Builder",
        20..=49 => "Architect",
        50..=99 => "Master Builder",
        _ => "Legendary Builder",
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LevelReward {
    pub level: u32,
    pub credits: u64,
    pub unlocks: &'static [&'static str],
}

const CREDITS_PER_LEVEL: u64 = 50;

/// Feature unlocks granted when a level is first reached.
const LEVEL_UNLOCKS: &[(u32, &[&str])] = &[
    (2, &["avatar_customization"]),
    (3, &["module_templates"]),
    (5, &["pattern_library", "hud_overlay"]),
    (10, &["advanced_modules", "team_collaboration"]),
    (15, &["custom_themes"]),
    (20, &["mentor_badge", "pattern_sharing"]),
    (25, &["api_access"]),
    (50, &["master_builder_tools"]),
    (75, &["legendary_avatar"]),
    (100, &["consciousness_architect"]),
];

/// One-time reward for reaching `level`: `level * 50` credits plus any milestone unlocks.
pub fn level_reward(level: u32) -> LevelReward {
    let unlocks = LEVEL_UNLOCKS
        .iter()
        .find(|(l, _)| *l == level)
        .map(|(_, u)| *u)
        .unwrap_or(&[]);
    LevelReward {
        level,
        credits: level as u64 * CREDITS_PER_LEVEL,
        unlocks,
    }
}

/// Levels that carry feature unlocks, for catalog listings.
pub fn milestone_levels() -> impl Iterator<Item = u32> {
    LEVEL_UNLOCKS.iter().map(|(l, _)| *l)
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ActionReward {
    pub action: &'static str,
    pub xp: u64,
    pub credits: u64,
    pub stat: Option<StatCounter>,
}

pub const ACTION_REWARDS: &[ActionReward] = &[
    ActionReward { action: "module_created", xp: 500, credits: 100, stat: Some(StatCounter::ModulesCreated) },
    ActionReward { action: "pattern_discovered", xp: 300, credits: 50, stat: Some(StatCounter::PatternsDiscovered) },
    ActionReward { action: "consciousness_raised", xp: 200, credits: 30, stat: Some(StatCounter::ConsciousnessRaised) },
    ActionReward { action: "helper_assisted", xp: 150, credits: 25, stat: Some(StatCounter::HelpersAssisted) },
    ActionReward { action: "daily_login", xp: 50, credits: 10, stat: None },
    ActionReward { action: "streak_bonus", xp: 500, credits: 100, stat: None },
    ActionReward { action: "module_shared", xp: 250, credits: 40, stat: None },
    ActionReward { action: "code_reviewed", xp: 100, credits: 20, stat: None },
    ActionReward { action: "feedback_given", xp: 50, credits: 10, stat: None },
];

pub fn action_reward(action: &str) -> Option<&'static ActionReward> {
    ACTION_REWARDS.iter().find(|r| r.action == action)
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub xp_reward: u64,
    pub credit_reward: u64,
    #[serde(skip)]
    pub unlocked_when: fn(&Profile) -> bool,
}

pub const ACHIEVEMENTS: &[Achievement] = &[
    Achievement {
        id: "first_module",
        name: "First Module",
        description: "Create your first module",
        xp_reward: 100,
        credit_reward: 50,
        unlocked_when: |p| p.stats.modules_created >= 1,
    },
    Achievement {
        id: "module_master",
        name: "Module Master",
        description: "Create 10 modules",
        xp_reward: 1000,
        credit_reward: 250,
        unlocked_when: |p| p.stats.modules_created >= 10,
    },
    Achievement {
        id: "pattern_seeker",
        name: "Pattern Seeker",
        description: "Discover 5 patterns",
        xp_reward: 500,
        credit_reward: 100,
        unlocked_when: |p| p.stats.patterns_discovered >= 5,
    },
    Achievement {
        id: "consciousness_catalyst",
        name: "Consciousness Catalyst",
        description: "Raise consciousness 10 times",
        xp_reward: 750,
        credit_reward: 150,
        unlocked_when: |p| p.stats.consciousness_raised >= 10,
    },
    Achievement {
        id: "helping_hand",
        name: "Helping Hand",
        description: "Assist 10 fellow builders",
        xp_reward: 600,
        credit_reward: 120,
        unlocked_when: |p| p.stats.helpers_assisted >= 10,
    },
    Achievement {
        id: "week_streak",
        name: "Week Warrior",
        description: "Log in 7 days in a row",
        xp_reward: 700,
        credit_reward: 150,
        unlocked_when: |p| p.streak >= 7,
    },
    Achievement {
        id: "month_streak",
        name: "Unstoppable",
        description: "Log in 30 days in a row",
        xp_reward: 3000,
        credit_reward: 600,
        unlocked_when: |p| p.streak >= 30,
    },
    Achievement {
        id: "rising_builder",
        name: "Rising Builder",
        description: "Reach level 5",
        xp_reward: 0,
        credit_reward: 200,
        unlocked_when: |p| p.level >= 5,
    },
    Achievement {
        id: "veteran_builder",
        name: "Veteran Builder",
        description: "Reach level 10",
        xp_reward: 0,
        credit_reward: 500,
        unlocked_when: |p| p.level >= 10,
    },
    Achievement {
        id: "credit_hoarder",
        name: "Credit Hoarder",
        description: "Hold 5000 credits at once",
        xp_reward: 250,
        credit_reward: 0,
        unlocked_when: |p| p.credits >= 5000,
    },
    Achievement {
        id: "centurion",
        name: "Centurion",
        description: "Perform 100 rewarded actions",
        xp_reward: 1000,
        credit_reward: 200,
        unlocked_when: |p| p.stats.total_actions >= 100,
    },
];

pub fn achievement(id: &str) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "catalog",
        "version": "0.1.0",
        "description": "Static action, level and achievement reward tables",
        "commands": [
            { "name": "actions", "description": "List action rewards" },
            { "name": "levels", "description": "List level thresholds and rewards", "parameters": ["max"] },
            { "name": "achievements", "description": "List the achievement catalog" }
        ],
        "storage": []
    })
}
