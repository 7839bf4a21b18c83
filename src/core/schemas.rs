//! Database and file names for the ledger workspace.
//!
//! The ledger keeps a single SQLite "bin" with one key-value table; every
//! persisted document (profiles, unlocked features) is a JSON value in it.

pub const LEDGER_DB_NAME: &str = "ledger.db";

pub const KV_DB_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS kv (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
";

pub const AUDIT_LOG_NAME: &str = "ledger.events.jsonl";

pub const CONFIG_FILE_NAME: &str = "ledger.toml";
