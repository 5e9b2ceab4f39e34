// Storage mode configuration.
// The mode is parsed once at the edge (CLI flag or environment) and injected
// into the repository factory. Core logic never reads the environment itself.

use serde::{Deserialize, Serialize};

/// Which backend the visit-history repository writes to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    Local,
    Hybrid,
    Remote,
}

impl Default for StorageMode {
    fn default() -> Self {
        StorageMode::Local
    }
}

impl StorageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageMode::Local => "local",
            StorageMode::Hybrid => "hybrid",
            StorageMode::Remote => "remote",
        }
    }
}

/// Parse a storage mode from a raw configuration value.
/// Whitespace and case are ignored; anything unrecognized falls back to local.
pub fn parse_storage_mode(value: Option<&str>) -> StorageMode {
    let Some(value) = value else {
        return StorageMode::default();
    };

    match value.trim().to_lowercase().as_str() {
        "local" => StorageMode::Local,
        "hybrid" => StorageMode::Hybrid,
        "remote" => StorageMode::Remote,
        _ => StorageMode::default(),
    }
}
