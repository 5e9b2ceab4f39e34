// Local store module
// Key-value persistence for the baby profile and the visit history.
// History reads and writes never raise: malformed payloads normalize to safe
// defaults, and a failed write falls back to a photo-stripped retry so the
// caller's in-memory list always matches what could be persisted.

pub mod migrations;

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use crate::constants::{BABY_INFO_KEY, MAX_HISTORY_ITEMS, MAX_MEMO_LENGTH, VISIT_HISTORY_KEY};
use crate::error::Result;
use crate::profile::BabyInfo;
use crate::record::VisitRecord;

/// Local key-value store backed by SQLite.
///
/// A store may also be opened disconnected (no backing database), in which
/// case every operation is a safe no-op returning sane defaults.
pub struct LocalStore {
    conn: Option<Mutex<Connection>>,
}

impl LocalStore {
    /// Open or create the store at the given path.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        migrations::run_migrations(&conn)?;

        Ok(LocalStore {
            conn: Some(Mutex::new(conn)),
        })
    }

    /// Open an in-memory store (used by tests and throwaway sessions).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrations::run_migrations(&conn)?;
        Ok(LocalStore {
            conn: Some(Mutex::new(conn)),
        })
    }

    /// A store with no storage backend. All operations no-op.
    pub fn disconnected() -> Self {
        LocalStore { conn: None }
    }

    fn get_raw(&self, key: &str) -> Option<String> {
        let conn = self.conn.as_ref()?.lock().ok()?;
        match conn.query_row(
            "SELECT value FROM app_settings WHERE key = ?1",
            [key],
            |row| row.get::<_, String>(0),
        ) {
            Ok(value) => Some(value),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => {
                log::warn!("Local store read for '{}' failed: {}", key, e);
                None
            }
        }
    }

    fn put_raw(&self, key: &str, value: &str) -> Result<()> {
        let Some(mutex) = self.conn.as_ref() else {
            return Ok(());
        };
        let conn = mutex
            .lock()
            .map_err(|_| crate::error::VisitLogError::Other("local store lock poisoned".to_string()))?;

        conn.execute(
            "INSERT INTO app_settings (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')",
            rusqlite::params![key, value],
        )?;

        Ok(())
    }

    fn delete_raw(&self, key: &str) {
        let Some(mutex) = self.conn.as_ref() else {
            return;
        };
        let Ok(conn) = mutex.lock() else {
            return;
        };
        if let Err(e) = conn.execute("DELETE FROM app_settings WHERE key = ?1", [key]) {
            log::warn!("Local store delete for '{}' failed: {}", key, e);
        }
    }

    /// Load the visit history. Malformed or absent payloads yield an empty
    /// list; entries are sanitized and capped.
    pub fn load_visit_history(&self) -> Vec<VisitRecord> {
        let Some(raw) = self.get_raw(VISIT_HISTORY_KEY) else {
            return Vec::new();
        };

        match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(serde_json::Value::Array(entries)) => sanitize_entries(entries),
            _ => Vec::new(),
        }
    }

    /// Persist the visit history and return the list the caller should hold.
    ///
    /// If the write is rejected (quota and the like), retry once with every
    /// photo stripped; if that also fails, still return the stripped list so
    /// the in-memory view never claims photos that could not be persisted.
    pub fn save_visit_history(&self, records: &[VisitRecord]) -> Vec<VisitRecord> {
        let normalized = sanitize_records(records);
        if self.conn.is_none() {
            return normalized;
        }

        if self.try_write_history(&normalized) {
            return normalized;
        }

        let stripped = strip_photos(&normalized);
        if !self.try_write_history(&stripped) {
            log::error!("Local store write failed even after stripping photos");
        }
        stripped
    }

    fn try_write_history(&self, records: &[VisitRecord]) -> bool {
        let payload = match serde_json::to_string(records) {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("Visit history serialization failed: {}", e);
                return false;
            }
        };

        match self.put_raw(VISIT_HISTORY_KEY, &payload) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Visit history write failed: {}", e);
                false
            }
        }
    }

    pub fn clear_visit_history(&self) {
        self.delete_raw(VISIT_HISTORY_KEY);
    }

    /// Load the baby profile, or None when absent or missing required fields.
    pub fn load_baby_info(&self) -> Option<BabyInfo> {
        let raw = self.get_raw(BABY_INFO_KEY)?;
        let info: BabyInfo = serde_json::from_str(&raw).ok()?;
        if info.is_valid() {
            Some(info)
        } else {
            None
        }
    }

    pub fn save_baby_info(&self, info: &BabyInfo) -> Result<()> {
        let payload = serde_json::to_string(info)?;
        self.put_raw(BABY_INFO_KEY, &payload)
    }

    pub fn clear_baby_info(&self) {
        self.delete_raw(BABY_INFO_KEY);
    }
}

/// Filter untrusted persisted entries, then truncate memos and cap the list.
/// An entry missing any required string field is dropped outright.
fn sanitize_entries(entries: Vec<serde_json::Value>) -> Vec<VisitRecord> {
    let records: Vec<VisitRecord> = entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<VisitRecord>(entry).ok())
        .collect();
    sanitize_records(&records)
}

/// Truncate memos to the persisted limit and keep the first (most recent)
/// `MAX_HISTORY_ITEMS` entries.
fn sanitize_records(records: &[VisitRecord]) -> Vec<VisitRecord> {
    records
        .iter()
        .take(MAX_HISTORY_ITEMS)
        .map(|record| {
            let mut record = record.clone();
            if record.memo.chars().count() > MAX_MEMO_LENGTH {
                record.memo = record.memo.chars().take(MAX_MEMO_LENGTH).collect();
            }
            record
        })
        .collect()
}

fn strip_photos(records: &[VisitRecord]) -> Vec<VisitRecord> {
    records
        .iter()
        .map(|record| {
            let mut record = record.clone();
            record.photo = None;
            record
        })
        .collect()
}
