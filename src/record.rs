// Visit record types shared by the local store, repositories, and migration.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::EPOCH_TIMESTAMP;

static DATA_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^data:image/[a-zA-Z0-9.+-]+;base64,").unwrap());

/// Check whether a string is inline image data (a base64 image data URL).
pub fn is_data_url(value: &str) -> bool {
    DATA_URL_RE.is_match(value)
}

/// A photo attached to a visit record.
///
/// Inline data never crosses to the remote document store; remote records only
/// carry `Stored` blob paths. The distinction is made once, here, instead of
/// re-inspecting raw strings everywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Photo {
    /// Image encoded directly as a base64 data URL.
    Inline(String),
    /// Reference into blob storage (`users/<userId>/visit-photos/<recordId>.jpg`).
    Stored(String),
}

impl Photo {
    /// Classify a raw persisted photo string.
    pub fn from_raw(value: String) -> Photo {
        if is_data_url(&value) {
            Photo::Inline(value)
        } else {
            Photo::Stored(value)
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Photo::Inline(data) => data,
            Photo::Stored(path) => path,
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Photo::Inline(_))
    }
}

// Persisted payloads store the photo as a plain string (data URL or blob path),
// so serialize transparently and re-classify on read.
impl Serialize for Photo {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Photo {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Photo::from_raw(raw))
    }
}

/// A user-logged visit, as held on device. Newest-first by convention.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VisitRecord {
    pub id: String,
    pub activity_id: String,
    pub activity_name: String,
    pub date: String,
    #[serde(default)]
    pub memo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<Photo>,
}

/// Provenance of a remote record: written by the app, or carried over by the
/// one-time history migration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    App,
    Migrated,
}

/// A visit record as stored in the remote document store.
/// Never carries inline image bytes, only an optional blob path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VisitRecordRemote {
    pub id: String,
    pub activity_id: String,
    pub activity_name: String,
    pub date: String,
    pub memo: String,
    pub photo_path: Option<String>,
    pub source: RecordSource,
    pub created_at: String,
    pub updated_at: String,
}

impl VisitRecordRemote {
    /// Map a remote record back to the local shape. The blob path rides along
    /// as a stored photo reference.
    pub fn into_local(self) -> VisitRecord {
        VisitRecord {
            id: self.id,
            activity_id: self.activity_id,
            activity_name: self.activity_name,
            date: self.date,
            memo: self.memo,
            photo: self.photo_path.filter(|p| !p.is_empty()).map(Photo::Stored),
        }
    }
}

/// Upsert payload for the remote document store. Timestamps are stamped
/// server-side, so they are absent here by construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpsertVisitRecord {
    pub id: String,
    pub activity_id: String,
    pub activity_name: String,
    pub date: String,
    pub memo: String,
    pub photo_path: Option<String>,
    pub source: RecordSource,
}

impl UpsertVisitRecord {
    pub fn from_record(record: &VisitRecord, photo_path: Option<String>, source: RecordSource) -> Self {
        UpsertVisitRecord {
            id: record.id.clone(),
            activity_id: record.activity_id.clone(),
            activity_name: record.activity_name.clone(),
            date: record.date.clone(),
            memo: record.memo.clone(),
            photo_path,
            source,
        }
    }
}

fn string_field(value: &serde_json::Value, key: &str) -> String {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

fn timestamp_field(value: &serde_json::Value, key: &str) -> String {
    match value.get(key).and_then(|v| v.as_str()) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => EPOCH_TIMESTAMP.to_string(),
    }
}

/// Normalize an untrusted remote document into a `VisitRecordRemote`.
/// Missing or mistyped fields fall back to safe defaults; an unknown source
/// tag is treated as an app write.
pub fn normalize_remote_record(id: &str, value: &serde_json::Value) -> VisitRecordRemote {
    let source = match value.get("source").and_then(|v| v.as_str()) {
        Some("migrated") => RecordSource::Migrated,
        _ => RecordSource::App,
    };

    VisitRecordRemote {
        id: id.to_string(),
        activity_id: string_field(value, "activityId"),
        activity_name: string_field(value, "activityName"),
        date: string_field(value, "date"),
        memo: string_field(value, "memo"),
        photo_path: value
            .get("photoPath")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        source,
        created_at: timestamp_field(value, "createdAt"),
        updated_at: timestamp_field(value, "updatedAt"),
    }
}
