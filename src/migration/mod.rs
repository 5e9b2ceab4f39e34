// Migration module
// One-time transfer of the on-device visit history into the remote store,
// with a persisted per-user status document driving retries.

pub mod runner;
pub mod status;

#[cfg(test)]
mod tests;

pub use runner::{run_migration_if_needed, MigrationDeps, MigrationRunResult};
pub use status::{MigrationStatusService, MigrationStatusStore};

use serde::{Deserialize, Serialize};

use crate::constants::MIGRATION_VERSION;

/// State machine over a user's migration status document.
///
/// idle -> running -> completed            (no failures; terminal)
///                 -> partial  -> running  (failures, retries remain)
///                 -> failed               (failures, retries exhausted; terminal)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MigrationState {
    Idle,
    Running,
    Partial,
    Completed,
    Failed,
}

/// One record that could not be migrated during an attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MigrationFailureItem {
    pub record_id: String,
    pub reason: String,
    pub occurred_at: String,
}

/// Per-user migration status, keyed remotely by the fixed version tag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MigrationStatus {
    pub version: String,
    pub state: MigrationState,
    pub attempts: u32,
    pub last_attempt_at: Option<String>,
    pub completed_at: Option<String>,
    pub failed_items: Vec<MigrationFailureItem>,
}

impl MigrationStatus {
    /// The status a user has before any migration attempt is recorded.
    pub fn initial() -> Self {
        MigrationStatus {
            version: MIGRATION_VERSION.to_string(),
            state: MigrationState::Idle,
            attempts: 0,
            last_attempt_at: None,
            completed_at: None,
            failed_items: Vec::new(),
        }
    }
}

fn normalize_failure_item(value: &serde_json::Value) -> Option<MigrationFailureItem> {
    Some(MigrationFailureItem {
        record_id: value.get("recordId")?.as_str()?.to_string(),
        reason: value.get("reason")?.as_str()?.to_string(),
        occurred_at: value.get("occurredAt")?.as_str()?.to_string(),
    })
}

/// Normalize an untrusted persisted status document.
///
/// Unknown states, negative or non-numeric attempt counts, and malformed
/// failure items are all discarded back to the initial defaults; the version
/// tag is always rewritten to the one this build understands.
pub fn normalize_migration_status(value: &serde_json::Value) -> MigrationStatus {
    if !value.is_object() {
        return MigrationStatus::initial();
    }

    let state = value
        .get("state")
        .and_then(|v| serde_json::from_value::<MigrationState>(v.clone()).ok())
        .unwrap_or(MigrationState::Idle);

    let attempts = match value.get("attempts").and_then(|v| v.as_f64()) {
        Some(n) if n > 0.0 => n.floor() as u32,
        _ => 0,
    };

    let failed_items = value
        .get("failedItems")
        .and_then(|v| v.as_array())
        .map(|items| items.iter().filter_map(normalize_failure_item).collect())
        .unwrap_or_default();

    let string_or_none = |key: &str| {
        value
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };

    MigrationStatus {
        version: MIGRATION_VERSION.to_string(),
        state,
        attempts,
        last_attempt_at: string_or_none("lastAttemptAt"),
        completed_at: string_or_none("completedAt"),
        failed_items,
    }
}
