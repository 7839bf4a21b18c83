use crate::core::db;
use crate::core::error;
use crate::core::schemas;
use crate::core::time;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

static DB_LOCK: Mutex<()> = Mutex::new(());

/// The DB Broker is the single path to the ledger database.
/// Connections are serialized in-process and every write leaves an audit line.
pub struct DbBroker {
    audit_log_path: PathBuf,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BrokerEvent {
    pub ts: String,
    pub event_id: String,
    pub actor: String,
    pub op: String,
    pub db_id: String,
    pub status: String,
}

impl DbBroker {
    pub fn new(root: &Path) -> Self {
        Self {
            audit_log_path: root.join(schemas::AUDIT_LOG_NAME),
        }
    }

    pub fn audit_log_path(&self) -> &Path {
        &self.audit_log_path
    }

    /// Execute a closure with a serialized connection to the specified DB.
    /// The outcome is appended to the audit log.
    pub fn with_conn<F, R>(
        &self,
        db_path: &Path,
        actor: &str,
        op_name: &str,
        f: F,
    ) -> Result<R, error::LedgerError>
    where
        F: FnOnce(&Connection) -> Result<R, error::LedgerError>,
    {
        let _lock = DB_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let db_id = db_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let conn = db::db_connect(&db_path.to_string_lossy())?;

        let result = f(&conn);

        let status = if result.is_ok() { "success" } else { "error" };
        self.log_event(actor, op_name, &db_id, status)?;

        result
    }

    /// Serialized connection for reads. Reads leave no audit line.
    pub fn with_read_conn<F, R>(&self, db_path: &Path, f: F) -> Result<R, error::LedgerError>
    where
        F: FnOnce(&Connection) -> Result<R, error::LedgerError>,
    {
        let _lock = DB_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let conn = db::db_connect(&db_path.to_string_lossy())?;
        f(&conn)
    }

    fn log_event(
        &self,
        actor: &str,
        op: &str,
        db_id: &str,
        status: &str,
    ) -> Result<(), error::LedgerError> {
        let ev = BrokerEvent {
            ts: time::now_epoch_z(),
            event_id: time::new_event_id(),
            actor: actor.to_string(),
            op: op.to_string(),
            db_id: db_id.to_string(),
            status: status.to_string(),
        };

        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.audit_log_path)?;

        writeln!(f, "{}", serde_json::to_string(&ev)?)?;
        Ok(())
    }

    /// Most recent `limit` audit events, oldest first. Unparseable lines are skipped.
    pub fn read_events(&self, limit: usize) -> Result<Vec<BrokerEvent>, error::LedgerError> {
        if !self.audit_log_path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(File::open(&self.audit_log_path)?);
        let mut events = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if let Ok(ev) = serde_json::from_str::<BrokerEvent>(&line) {
                events.push(ev);
            }
        }
        let skip = events.len().saturating_sub(limit);
        Ok(events.split_off(skip))
    }
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "broker",
        "version": "0.1.0",
        "description": "Serialized ledger database access with an append-only audit log",
        "commands": [
            { "name": "audit", "description": "Show the mutation audit log", "parameters": ["limit"] }
        ],
        "storage": [schemas::AUDIT_LOG_NAME]
    })
}
