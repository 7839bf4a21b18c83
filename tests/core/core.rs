use builder_ledger::core::broker::DbBroker;
use builder_ledger::core::config::{self, LedgerConfig};
use builder_ledger::core::db::{SqliteStore, initialize_ledger_db, ledger_db_path};
use builder_ledger::core::error::LedgerError;
use builder_ledger::core::schemas;
use builder_ledger::core::store::{KvStore, Store};
use builder_ledger::core::time::FixedClock;
use builder_ledger::plugins::ledger::Ledger;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_sqlite_store_get_set_keys() {
    let tmp = tempdir().unwrap();
    let mut kv = SqliteStore::open(tmp.path(), "tester").unwrap();

    assert_eq!(kv.get("profile:a").unwrap(), None);
    kv.set("profile:b", "{\"n\":2}").unwrap();
    kv.set("profile:a", "{\"n\":1}").unwrap();
    kv.set("features:a", "{}").unwrap();
    kv.set("profile:a", "{\"n\":3}").unwrap();

    assert_eq!(kv.get("profile:a").unwrap().as_deref(), Some("{\"n\":3}"));
    assert_eq!(kv.keys("profile:").unwrap(), vec!["profile:a", "profile:b"]);
    assert_eq!(kv.keys("").unwrap().len(), 3);
}

#[test]
fn test_broker_writes_one_audit_line_per_operation() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    initialize_ledger_db(root).unwrap();
    let broker = DbBroker::new(root);

    let result: Result<(), LedgerError> =
        broker.with_conn(&ledger_db_path(root), "tester", "test.fail", |_conn| {
            Err(LedgerError::ValidationError("nope".to_string()))
        });
    assert!(result.is_err());

    let events = broker.read_events(10).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].op, "kv.init");
    assert_eq!(events[1].op, "test.fail");
    assert_eq!(events[1].status, "error");
    assert_eq!(events[1].actor, "tester");
    assert_eq!(events[1].db_id, schemas::LEDGER_DB_NAME);

    let last = broker.read_events(1).unwrap();
    assert_eq!(last.len(), 1);
    assert_eq!(last[0].op, "test.fail");
}

#[test]
fn test_only_writes_reach_the_audit_log() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    let mut kv = SqliteStore::open(root, "tester").unwrap();
    kv.set("profile:a", "{}").unwrap();

    let reopened = SqliteStore::open(root, "tester").unwrap();
    reopened.get("profile:a").unwrap();
    reopened.get("profile:missing").unwrap();
    reopened.keys("profile:").unwrap();

    let ops: Vec<String> = DbBroker::new(root)
        .read_events(50)
        .unwrap()
        .into_iter()
        .map(|ev| ev.op)
        .collect();
    assert_eq!(ops, vec!["kv.init", "kv.set"]);
}

#[test]
fn test_audit_reader_skips_garbage_lines() {
    let tmp = tempdir().unwrap();
    let broker = DbBroker::new(tmp.path());
    assert!(broker.read_events(5).unwrap().is_empty());

    fs::write(broker.audit_log_path(), "garbage\n").unwrap();
    assert!(broker.read_events(5).unwrap().is_empty());
}

#[test]
fn test_profile_survives_reopen_on_sqlite() {
    let tmp = tempdir().unwrap();
    let store = Store::init(tmp.path()).unwrap();

    let builder_id = {
        let kv = SqliteStore::open(&store.root, "tester").unwrap();
        let mut ledger = Ledger::open(kv, LedgerConfig::default(), FixedClock(1_000)).unwrap();
        ledger.reward_action("module_created").unwrap();
        assert!(ledger.spend_credits(30, "sticker").unwrap());
        ledger.profile().builder_id.clone()
    };

    let kv = SqliteStore::open(&store.root, "tester").unwrap();
    let ledger = Ledger::open(kv, LedgerConfig::default(), FixedClock(2_000)).unwrap();
    let p = ledger.profile();
    assert_eq!(p.builder_id, builder_id);
    assert_eq!(p.xp, 500);
    assert_eq!(p.credits, 170);
    assert_eq!(p.stats.modules_created, 1);
    assert_eq!(p.purchase_history.len(), 1);
}

#[test]
fn test_devices_in_one_store_are_independent() {
    let tmp = tempdir().unwrap();
    let store = Store::init(tmp.path()).unwrap();
    let laptop = LedgerConfig {
        device: "laptop".to_string(),
        ..LedgerConfig::default()
    };

    let mut a = Ledger::open(
        SqliteStore::open(&store.root, "a").unwrap(),
        LedgerConfig::default(),
        FixedClock(0),
    )
    .unwrap();
    a.add_xp(700, "work").unwrap();

    let b = Ledger::open(SqliteStore::open(&store.root, "b").unwrap(), laptop, FixedClock(0)).unwrap();
    assert_eq!(b.profile().xp, 0);
    assert_ne!(b.profile().builder_id, a.profile().builder_id);
}

#[test]
fn test_config_file_in_store_root_is_honoured() {
    let tmp = tempdir().unwrap();
    let store = Store::init(tmp.path()).unwrap();
    fs::write(
        store.root.join(schemas::CONFIG_FILE_NAME),
        "device = \"studio\"\nstarting_credits = 40\n",
    )
    .unwrap();

    let cfg = config::load_config(&store.root).unwrap();
    assert_eq!(cfg.device, "studio");
    assert_eq!(cfg.profile_key(), "profile:studio");

    let ledger = Ledger::open(
        SqliteStore::open(&store.root, &cfg.actor).unwrap(),
        cfg,
        FixedClock(0),
    )
    .unwrap();
    assert_eq!(ledger.profile().credits, 40);
}

#[test]
fn test_unparseable_config_is_an_error() {
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join(schemas::CONFIG_FILE_NAME), "device = [").unwrap();
    assert!(matches!(
        config::load_config(tmp.path()),
        Err(LedgerError::ConfigError(_))
    ));
}
