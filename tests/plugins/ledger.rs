use builder_ledger::core::config::LedgerConfig;
use builder_ledger::core::events::LedgerEvent;
use builder_ledger::core::store::{KvStore, MemoryStore};
use builder_ledger::core::time::FixedClock;
use builder_ledger::plugins::catalog::{self, xp_for_level};
use builder_ledger::plugins::ledger::Ledger;
use builder_ledger::plugins::profile::{EntryKind, Profile};

const NOW: i64 = 1_760_000_000_000;

fn fresh() -> Ledger<MemoryStore> {
    Ledger::open(MemoryStore::new(), LedgerConfig::default(), FixedClock(NOW)).unwrap()
}

fn seeded(profile: &Profile) -> Ledger<MemoryStore> {
    let mut kv = MemoryStore::new();
    kv.set("profile:default", &profile.to_json().unwrap()).unwrap();
    Ledger::open(kv, LedgerConfig::default(), FixedClock(NOW)).unwrap()
}

fn assert_level_invariant(p: &Profile) {
    assert!(p.level >= 1);
    assert!(p.xp < xp_for_level(p.level + 1), "xp {} at level {}", p.xp, p.level);
    if p.level > 1 {
        assert!(p.xp >= xp_for_level(p.level), "xp {} at level {}", p.xp, p.level);
    }
}

#[test]
fn test_new_profile_seed_values_are_persisted() {
    let ledger = fresh();
    let p = ledger.profile();
    assert_eq!((p.xp, p.level, p.credits), (0, 1, 100));

    let raw = ledger.store().get("profile:default").unwrap().unwrap();
    let stored = Profile::from_json(&raw).unwrap();
    assert_eq!(&stored, p);
}

#[test]
fn test_threshold_is_monotonic_and_anchored() {
    assert_eq!(xp_for_level(1), 100);
    for level in 1..500 {
        assert!(xp_for_level(level + 1) > xp_for_level(level));
    }
}

#[test]
fn test_level_invariant_survives_add_xp_sequences() {
    let mut ledger = fresh();
    for amount in [0, 1, 99, 465, 1, 992, 5000, 3, 40_000, 17, 250_000, 1_000_000] {
        ledger.add_xp(amount, "sequence").unwrap();
        assert_level_invariant(ledger.profile());
    }
}

#[test]
fn test_multi_level_jump_applies_every_level_reward_in_order() {
    let mut ledger = fresh();
    let rx = ledger.subscribe();

    let award = ledger.add_xp(50_000, "test").unwrap();

    assert!(award.did_level_up);
    assert_eq!(award.awarded, 50_000);
    assert_eq!(award.new_level, Some(12));
    assert_eq!(award.levels_crossed, (2..=12).collect::<Vec<u32>>());
    assert_eq!(ledger.profile().level, 12);

    let level_credits: u64 = (2..=12u64).map(|l| l * 50).sum();
    assert_eq!(level_credits, 3850);
    assert_eq!(ledger.profile().credits, 100 + level_credits);
    assert_eq!(ledger.profile().credit_history.len(), 11);

    let levels: Vec<u32> = rx
        .try_iter()
        .filter_map(|ev| match ev {
            LedgerEvent::LevelUp { level, .. } => Some(level),
            _ => None,
        })
        .collect();
    assert_eq!(levels, (2..=12).collect::<Vec<u32>>());

    let features = ledger.unlocked_features().unwrap();
    for f in [
        "avatar_customization",
        "module_templates",
        "pattern_library",
        "hud_overlay",
        "advanced_modules",
        "team_collaboration",
    ] {
        assert_eq!(features.get(f).map(String::as_str), Some("unlocked"), "{}", f);
    }
    assert!(!features.contains_key("custom_themes"));
}

#[test]
fn test_earn_credits_appends_history_and_returns_balance() {
    let mut ledger = fresh();
    let balance = ledger.earn_credits(40, "bounty").unwrap();
    assert_eq!(balance, 140);
    let entry = ledger.profile().credit_history.last().unwrap();
    assert_eq!(entry.kind, EntryKind::Earn);
    assert_eq!(entry.amount, 40);
    assert_eq!(entry.reason, "bounty");
    assert_eq!(entry.timestamp, NOW);
}

#[test]
fn test_spend_credits_never_goes_negative() {
    let mut ledger = fresh();
    let rx = ledger.subscribe();

    assert!(!ledger.spend_credits(101, "hat").unwrap());
    assert_eq!(ledger.profile().credits, 100);
    assert!(ledger.profile().purchase_history.is_empty());
    assert!(matches!(
        rx.try_recv(),
        Ok(LedgerEvent::PurchaseRejected { needed: 101, available: 100, .. })
    ));

    assert!(ledger.spend_credits(60, "hat").unwrap());
    assert_eq!(ledger.profile().credits, 40);
    assert!(ledger.spend_credits(40, "scarf").unwrap());
    assert_eq!(ledger.profile().credits, 0);
    assert_eq!(ledger.profile().purchase_history.len(), 2);
    assert_eq!(ledger.profile().purchase_history[0].kind, EntryKind::Spend);
}

#[test]
fn test_try_spend_reports_typed_insufficient_funds() {
    let mut ledger = fresh();
    let err = ledger.try_spend_credits(500, "jetpack").unwrap_err();
    assert!(matches!(
        err,
        builder_ledger::core::error::LedgerError::InsufficientFunds { needed: 500, available: 100 }
    ));
    assert_eq!(err.to_string(), "Not enough credits: need 500, have 100");
}

#[test]
fn test_module_created_scenario() {
    let mut ledger = fresh();
    let outcome = ledger.reward_action("module_created").unwrap().unwrap();

    let p = ledger.profile();
    assert_eq!(p.xp, 500);
    assert_eq!(p.credits, 200);
    assert_eq!(p.stats.modules_created, 1);
    assert_eq!(p.level, 1);
    assert!(!outcome.xp.did_level_up);
    assert_eq!(outcome.balance, 200);
}

#[test]
fn test_unknown_action_is_a_no_op() {
    let mut ledger = fresh();
    let rx = ledger.subscribe();
    let before = ledger.profile().clone();

    assert!(ledger.reward_action("nonexistent_action_xyz").unwrap().is_none());

    assert_eq!(ledger.profile(), &before);
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_every_tabled_action_bumps_its_counter() {
    let mut ledger = fresh();
    for action in ["pattern_discovered", "consciousness_raised", "helper_assisted"] {
        ledger.reward_action(action).unwrap();
    }
    let stats = &ledger.profile().stats;
    assert_eq!(stats.patterns_discovered, 1);
    assert_eq!(stats.consciousness_raised, 1);
    assert_eq!(stats.helpers_assisted, 1);
    assert_eq!(stats.modules_created, 0);
    assert_eq!(stats.total_actions, 3);
}

#[test]
fn test_check_achievements_is_idempotent() {
    let mut ledger = fresh();
    ledger.reward_action("module_created").unwrap();

    let first = ledger.check_achievements().unwrap();
    let ids: Vec<&str> = first.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec!["first_module"]);
    assert_eq!(ledger.profile().achievements, vec!["first_module".to_string()]);

    let second = ledger.check_achievements().unwrap();
    assert!(second.is_empty());
}

#[test]
fn test_achievement_rewards_are_granted_once() {
    let mut ledger = fresh();
    ledger.reward_action("module_created").unwrap();
    ledger.check_achievements().unwrap();

    let first_module = catalog::achievement("first_module").unwrap();
    let p = ledger.profile();
    assert_eq!(p.xp, 500 + first_module.xp_reward);
    // module reward, first_module reward, level 2 reward
    assert_eq!(p.credits, 100 + 100 + first_module.credit_reward + 100);
    assert_eq!(p.level, 2);

    ledger.check_achievements().unwrap();
    assert_eq!(ledger.profile().xp, 500 + first_module.xp_reward);
}

#[test]
fn test_reward_unlocking_a_later_achievement_settles_in_one_check() {
    let mut profile = Profile::new(100, NOW);
    profile.stats.modules_created = 1;
    profile.xp = xp_for_level(5) - 50;
    profile.level = 4;
    let mut ledger = seeded(&profile);

    let first = ledger.check_achievements().unwrap();
    assert_eq!(
        first.iter().map(|a| a.id).collect::<Vec<_>>(),
        vec!["first_module", "rising_builder"]
    );
    assert_eq!(ledger.profile().level, 5);
    // start, level 5 reward, first_module, rising_builder
    assert_eq!(ledger.profile().credits, 100 + 250 + 50 + 200);

    assert!(ledger.check_achievements().unwrap().is_empty());
}

#[test]
fn test_reward_unlocking_an_earlier_achievement_settles_in_one_check() {
    let mut profile = Profile::new(100, NOW);
    profile.stats.total_actions = 100;
    profile.xp = xp_for_level(5) - 500;
    profile.level = 4;
    let mut ledger = seeded(&profile);

    let first = ledger.check_achievements().unwrap();
    assert_eq!(
        first.iter().map(|a| a.id).collect::<Vec<_>>(),
        vec!["centurion", "rising_builder"]
    );
    assert!(ledger.check_achievements().unwrap().is_empty());
}

#[test]
fn test_level_reward_overflow_leaves_profile_untouched() {
    let profile = Profile::new(u64::MAX - 10, NOW);
    let mut ledger = seeded(&profile);
    let rx = ledger.subscribe();

    let err = ledger.add_xp(xp_for_level(2), "overflow").unwrap_err();
    assert!(matches!(
        err,
        builder_ledger::core::error::LedgerError::ValidationError(_)
    ));

    let p = ledger.profile();
    assert_eq!((p.xp, p.level, p.credits), (0, 1, u64::MAX - 10));
    assert_eq!(p.stats.total_actions, 0);
    assert!(p.credit_history.is_empty());
    assert!(rx.try_recv().is_err());
    assert!(ledger.unlocked_features().unwrap().is_empty());

    let raw = ledger.store().get("profile:default").unwrap().unwrap();
    let stored = Profile::from_json(&raw).unwrap();
    assert_eq!((stored.xp, stored.level), (0, 1));
}

#[test]
fn test_zero_reward_achievement_grants_only_credits() {
    let mut profile = Profile::new(100, NOW);
    profile.xp = xp_for_level(5);
    profile.level = 5;
    let mut ledger = seeded(&profile);
    let actions_before = ledger.profile().stats.total_actions;

    let unlocked = ledger.check_achievements().unwrap();
    assert_eq!(unlocked.iter().map(|a| a.id).collect::<Vec<_>>(), vec!["rising_builder"]);
    assert_eq!(ledger.profile().xp, xp_for_level(5));
    assert_eq!(ledger.profile().credits, 300);
    assert_eq!(ledger.profile().stats.total_actions, actions_before);
}

#[test]
fn test_every_mutation_publishes_a_snapshot() {
    let mut ledger = fresh();
    let rx = ledger.subscribe();

    ledger.add_xp(10, "a").unwrap();
    ledger.earn_credits(1, "b").unwrap();
    ledger.spend_credits(1, "c").unwrap();

    let snapshots: Vec<Profile> = rx
        .try_iter()
        .filter_map(|ev| match ev {
            LedgerEvent::ProfileUpdated(p) => Some(p),
            _ => None,
        })
        .collect();
    assert_eq!(snapshots.len(), 3);
    assert_eq!(snapshots[0].xp, 10);
    assert_eq!(snapshots[1].credits, 101);
    assert_eq!(snapshots[2].credits, 100);
}

#[test]
fn test_inconsistent_cached_level_is_rederived_on_open() {
    let mut profile = Profile::new(100, NOW);
    profile.xp = 600;
    profile.level = 7;
    let ledger = seeded(&profile);
    assert_eq!(ledger.profile().level, 2);
}
