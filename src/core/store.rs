//! Store abstraction for the ledger's persisted state.
//!
//! Two layers live here:
//! - [`Store`]: the on-disk workspace (`.ledger/`) that holds the SQLite
//!   database, the audit log and the optional `ledger.toml`.
//! - [`KvStore`]: the minimal key-value contract the ledger persists through.
//!   Every value is a JSON document stored under a string key.

use crate::core::error::LedgerError;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory name marking a ledger workspace.
pub const STORE_DIR_NAME: &str = ".ledger";

/// Store handle representing a ledger workspace on disk.
#[derive(Debug, Clone)]
pub struct Store {
    /// Absolute path to the store root directory (the `.ledger` dir itself)
    pub root: PathBuf,
}

impl Store {
    /// Create the workspace under `dir` if it does not exist yet.
    pub fn init(dir: &Path) -> Result<Self, LedgerError> {
        let root = dir.join(STORE_DIR_NAME);
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Walk from `start_dir` upwards until a `.ledger` directory is found.
    pub fn discover(start_dir: &Path) -> Result<Self, LedgerError> {
        let mut current_dir = PathBuf::from(start_dir);
        loop {
            let candidate = current_dir.join(STORE_DIR_NAME);
            if candidate.is_dir() {
                return Ok(Self { root: candidate });
            }
            if !current_dir.pop() {
                return Err(LedgerError::NotFound(
                    "'.ledger' directory not found in current or parent directories. Run `builder-ledger init` first.".to_string(),
                ));
            }
        }
    }
}

/// Minimal persistence contract: JSON blobs under string keys.
///
/// Implementations must make `set` durable before returning; the ledger
/// relies on write-through semantics and never batches.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>, LedgerError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), LedgerError>;

    /// All keys starting with `prefix`, in ascending key order.
    fn keys(&self, prefix: &str) -> Result<Vec<String>, LedgerError>;
}

/// In-memory backend. Used for embedding and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, LedgerError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), LedgerError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn keys(&self, prefix: &str) -> Result<Vec<String>, LedgerError> {
        Ok(self
            .entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }
}

impl<T: KvStore + ?Sized> KvStore for &mut T {
    fn get(&self, key: &str) -> Result<Option<String>, LedgerError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), LedgerError> {
        (**self).set(key, value)
    }

    fn keys(&self, prefix: &str) -> Result<Vec<String>, LedgerError> {
        (**self).keys(prefix)
    }
}
