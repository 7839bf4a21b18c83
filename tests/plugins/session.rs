use builder_ledger::core::config::LedgerConfig;
use builder_ledger::core::store::{KvStore, MemoryStore};
use builder_ledger::core::time::{FixedClock, MILLIS_PER_DAY};
use builder_ledger::plugins::catalog;
use builder_ledger::plugins::ledger::Ledger;
use builder_ledger::plugins::profile::Profile;

const NOW: i64 = 1_760_000_000_000;

fn ledger_with(last_active: i64, streak: u32) -> Ledger<MemoryStore> {
    let mut profile = Profile::new(100, last_active);
    profile.streak = streak;
    let mut kv = MemoryStore::new();
    kv.set("profile:default", &profile.to_json().unwrap()).unwrap();
    Ledger::open(kv, LedgerConfig::default(), FixedClock(NOW)).unwrap()
}

#[test]
fn test_gap_of_several_days_resets_streak_to_one() {
    let mut ledger = ledger_with(NOW - 3 * MILLIS_PER_DAY, 5);
    let report = ledger.start_session().unwrap();

    assert_eq!(ledger.profile().streak, 1);
    assert!(report.daily_reward);
    assert!(report.streak_reset);
    assert!(!report.streak_bonus);
    assert_eq!(report.days_away, 3);

    let login = catalog::action_reward("daily_login").unwrap();
    assert_eq!(ledger.profile().xp, login.xp);
    assert_eq!(ledger.profile().credits, 100 + login.credits);
    assert_eq!(ledger.profile().last_active, NOW);
}

#[test]
fn test_consecutive_day_reaching_seven_pays_streak_bonus() {
    let mut ledger = ledger_with(NOW - MILLIS_PER_DAY, 6);
    let report = ledger.start_session().unwrap();

    assert_eq!(ledger.profile().streak, 7);
    assert!(report.daily_reward);
    assert!(report.streak_bonus);
    assert!(!report.streak_reset);

    let login = catalog::action_reward("daily_login").unwrap();
    let bonus = catalog::action_reward("streak_bonus").unwrap();
    assert_eq!(ledger.profile().xp, login.xp + bonus.xp);
    assert_eq!(ledger.profile().credits, 100 + login.credits + bonus.credits);
}

#[test]
fn test_consecutive_day_without_multiple_of_seven_has_no_bonus() {
    let mut ledger = ledger_with(NOW - MILLIS_PER_DAY - 5_000, 2);
    let report = ledger.start_session().unwrap();

    assert_eq!(ledger.profile().streak, 3);
    assert!(report.daily_reward);
    assert!(!report.streak_bonus);
}

#[test]
fn test_same_day_session_does_not_reward_twice() {
    let mut ledger = ledger_with(NOW - 2 * 60 * 60 * 1000, 4);
    let report = ledger.start_session().unwrap();

    assert!(!report.daily_reward);
    assert_eq!(report.days_away, 0);
    assert_eq!(ledger.profile().streak, 4);
    assert_eq!(ledger.profile().xp, 0);
    assert_eq!(ledger.profile().credits, 100);
    assert_eq!(ledger.profile().last_active, NOW);

    let again = ledger.start_session().unwrap();
    assert!(!again.daily_reward);
    assert_eq!(ledger.profile().xp, 0);
}

#[test]
fn test_clock_moving_backwards_is_treated_as_same_day() {
    let mut ledger = ledger_with(NOW + 5 * MILLIS_PER_DAY, 3);
    let report = ledger.start_session().unwrap();

    assert!(!report.daily_reward);
    assert_eq!(ledger.profile().streak, 3);
    assert_eq!(ledger.profile().last_active, NOW);
}

#[test]
fn test_corrupt_profile_blob_falls_back_to_fresh_profile() {
    let mut kv = MemoryStore::new();
    kv.set("profile:default", "{ this is not json").unwrap();

    let ledger = Ledger::open(kv, LedgerConfig::default(), FixedClock(NOW)).unwrap();
    let p = ledger.profile();
    assert_eq!((p.xp, p.level, p.credits), (0, 1, 100));
    assert_eq!(p.created_at, NOW);

    let raw = ledger.store().get("profile:default").unwrap().unwrap();
    assert!(Profile::from_json(&raw).is_ok());
}

#[test]
fn test_configured_starting_credits_seed_new_profiles() {
    let config = LedgerConfig {
        starting_credits: 250,
        ..LedgerConfig::default()
    };
    let ledger = Ledger::open(MemoryStore::new(), config, FixedClock(NOW)).unwrap();
    assert_eq!(ledger.profile().credits, 250);
}

#[test]
fn test_first_session_on_new_profile_is_not_a_login_day() {
    let mut ledger = Ledger::open(MemoryStore::new(), LedgerConfig::default(), FixedClock(NOW)).unwrap();
    let report = ledger.start_session().unwrap();
    assert!(!report.daily_reward);
    assert_eq!(report.streak, 1);
}
