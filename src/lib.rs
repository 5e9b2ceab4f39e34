// Visitlog - Library Entry Point
// Visit-history persistence with three storage modes and a one-time
// local-to-remote migration.

pub mod config;
pub mod constants;
pub mod error;
pub mod migration;
pub mod places;
pub mod profile;
pub mod record;
pub mod remote;
pub mod repository;
pub mod store;
pub mod weather;

pub use config::{parse_storage_mode, StorageMode};
pub use error::{Result, VisitLogError};
pub use migration::{run_migration_if_needed, MigrationDeps, MigrationRunResult};
pub use record::{Photo, RecordSource, VisitRecord, VisitRecordRemote};
pub use repository::{create_repository, VisitHistoryRepository};
pub use store::LocalStore;
