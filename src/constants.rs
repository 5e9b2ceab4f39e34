// Visitlog Constants
// Storage keys and migration limits are part of the persisted contract.
// Do not change them without a data migration plan.

// Local store keys (JSON-encoded payloads)
pub const BABY_INFO_KEY: &str = "babyInfo";
pub const VISIT_HISTORY_KEY: &str = "visitHistory";

// History sanitization limits
pub const MAX_HISTORY_ITEMS: usize = 100;
pub const MAX_MEMO_LENGTH: usize = 1000;

// Migration
pub const MIGRATION_VERSION: &str = "visitHistoryV1";
pub const MAX_MIGRATION_ATTEMPTS: u32 = 3;

// Paths
pub const VISITLOG_FOLDER: &str = ".visitlog";
pub const DB_FILENAME: &str = "visitlog.db";

// Photo blobs
pub const PHOTO_CONTENT_TYPE: &str = "image/jpeg";
pub const PHOTO_EXTENSION: &str = "jpg";

// Weather
pub const WEATHER_API_KEY_PLACEHOLDER: &str = "YOUR_WEATHER_API_KEY";
pub const WEATHER_FALLBACK_TEMP: i32 = 22;
pub const BAD_OUTDOOR_CONDITIONS: [&str; 4] = ["Rain", "Snow", "Thunderstorm", "Extreme"];

// Timestamp used when a remote document carries no usable server stamp
pub const EPOCH_TIMESTAMP: &str = "1970-01-01T00:00:00Z";
