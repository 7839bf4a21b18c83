use crate::core::broker::DbBroker;
use crate::core::error;
use crate::core::schemas;
use crate::core::store::KvStore;
use crate::core::time;
use rusqlite::{Connection, OptionalExtension, params};
use std::fs;
use std::path::{Path, PathBuf};

pub fn db_connect(db_path: &str) -> Result<Connection, error::LedgerError> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))?;
    Ok(conn)
}

pub fn ledger_db_path(root: &Path) -> PathBuf {
    root.join(schemas::LEDGER_DB_NAME)
}

pub fn initialize_ledger_db(root: &Path) -> Result<(), error::LedgerError> {
    fs::create_dir_all(root)?;
    let broker = DbBroker::new(root);
    let db_path = ledger_db_path(root);
    broker.with_conn(&db_path, "ledger", "kv.init", |conn| {
        conn.execute(schemas::KV_DB_SCHEMA, [])?;
        Ok(())
    })
}

/// SQLite-backed [`KvStore`]. Every `set` is its own committed, audited statement.
pub struct SqliteStore {
    root: PathBuf,
    actor: String,
}

impl SqliteStore {
    /// Open the store under `root`, creating the database on first use.
    pub fn open(root: &Path, actor: &str) -> Result<Self, error::LedgerError> {
        if !ledger_db_path(root).exists() {
            initialize_ledger_db(root)?;
        }
        Ok(Self {
            root: root.to_path_buf(),
            actor: actor.to_string(),
        })
    }

    fn broker(&self) -> DbBroker {
        DbBroker::new(&self.root)
    }
}

impl KvStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, error::LedgerError> {
        let db_path = ledger_db_path(&self.root);
        self.broker()
            .with_read_conn(&db_path, |conn| {
                let value = conn
                    .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                        row.get::<_, String>(0)
                    })
                    .optional()?;
                Ok(value)
            })
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), error::LedgerError> {
        let db_path = ledger_db_path(&self.root);
        let now = time::now_epoch_z();
        self.broker()
            .with_conn(&db_path, &self.actor, "kv.set", |conn| {
                conn.execute(
                    "INSERT INTO kv(key, value, updated_at) VALUES(?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                    params![key, value, now],
                )?;
                Ok(())
            })
    }

    fn keys(&self, prefix: &str) -> Result<Vec<String>, error::LedgerError> {
        let db_path = ledger_db_path(&self.root);
        self.broker()
            .with_read_conn(&db_path, |conn| {
                let mut stmt =
                    conn.prepare("SELECT key FROM kv WHERE substr(key, 1, ?2) = ?1 ORDER BY key")?;
                let rows = stmt.query_map(params![prefix, prefix.chars().count() as i64], |row| {
                    row.get::<_, String>(0)
                })?;
                let mut out = Vec::new();
                for r in rows {
                    out.push(r?);
                }
                Ok(out)
            })
    }
}
