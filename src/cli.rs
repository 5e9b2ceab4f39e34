// Visitlog CLI binary

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

use visitlog::config::{parse_storage_mode, StorageMode};
use visitlog::constants::{DB_FILENAME, VISITLOG_FOLDER};
use visitlog::migration::status::MigrationStatusService;
use visitlog::migration::{run_migration_if_needed, MigrationDeps};
use visitlog::record::{Photo, VisitRecord};
use visitlog::remote::http::{HttpMigrationStatusStore, HttpPhotoClient, HttpVisitRecordClient};
use visitlog::repository::{create_repository, VisitHistoryRepository};
use visitlog::store::LocalStore;

const STORAGE_MODE_ENV: &str = "VISITLOG_STORAGE_MODE";
const REMOTE_URL_ENV: &str = "VISITLOG_REMOTE_URL";
const DEFAULT_REMOTE_URL: &str = "http://localhost:8080";

#[derive(Parser)]
#[command(name = "visitlog")]
#[command(about = "Visitlog - visit history with local/remote/hybrid storage", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CommonOpts {
    /// User id owning the history
    #[arg(short, long, default_value = "local-user")]
    user: String,

    /// Local database path (defaults to ~/.visitlog/visitlog.db)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Storage mode: local, hybrid, or remote (defaults to $VISITLOG_STORAGE_MODE)
    #[arg(short, long)]
    mode: Option<String>,

    /// Remote store base URL (defaults to $VISITLOG_REMOTE_URL)
    #[arg(long)]
    base_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a visit
    Add {
        /// Activity id
        activity_id: String,
        /// Activity display name
        activity_name: String,
        /// Visit date (defaults to today)
        #[arg(short, long)]
        date: Option<String>,
        /// Free-form memo
        #[arg(long, default_value = "")]
        memo: String,
        /// Photo as an image data URL
        #[arg(long)]
        photo: Option<String>,
        #[command(flatten)]
        common: CommonOpts,
    },

    /// List the visit history
    List {
        #[command(flatten)]
        common: CommonOpts,
    },

    /// Remove a visit by record id
    Remove {
        /// Record id
        id: String,
        #[command(flatten)]
        common: CommonOpts,
    },

    /// Clear the visit history
    Clear {
        #[command(flatten)]
        common: CommonOpts,
    },

    /// Run the local-to-remote history migration if needed
    Migrate {
        #[command(flatten)]
        common: CommonOpts,
    },

    /// Show the migration status document
    Status {
        #[command(flatten)]
        common: CommonOpts,
    },

    /// Show the effective storage mode
    Mode {
        #[command(flatten)]
        common: CommonOpts,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Add {
            activity_id,
            activity_name,
            date,
            memo,
            photo,
            common,
        } => cmd_add(common, activity_id, activity_name, date, memo, photo).await,
        Commands::List { common } => cmd_list(common).await,
        Commands::Remove { id, common } => cmd_remove(common, id).await,
        Commands::Clear { common } => cmd_clear(common).await,
        Commands::Migrate { common } => cmd_migrate(common).await,
        Commands::Status { common } => cmd_status(common).await,
        Commands::Mode { common } => cmd_mode(common),
    }
}

fn resolve_mode(common: &CommonOpts) -> StorageMode {
    let from_env = std::env::var(STORAGE_MODE_ENV).ok();
    parse_storage_mode(common.mode.as_deref().or(from_env.as_deref()))
}

fn resolve_base_url(common: &CommonOpts) -> String {
    common
        .base_url
        .clone()
        .or_else(|| std::env::var(REMOTE_URL_ENV).ok())
        .unwrap_or_else(|| DEFAULT_REMOTE_URL.to_string())
}

fn resolve_db_path(common: &CommonOpts) -> Result<PathBuf> {
    if let Some(db) = &common.db {
        return Ok(db.clone());
    }

    let dirs = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    Ok(dirs.home_dir().join(VISITLOG_FOLDER).join(DB_FILENAME))
}

fn open_repository(common: &CommonOpts) -> Result<Arc<dyn VisitHistoryRepository>> {
    let mode = resolve_mode(common);
    let base_url = resolve_base_url(common);
    let store = Arc::new(LocalStore::open(&resolve_db_path(common)?)?);

    let http = reqwest::Client::new();
    let records = Arc::new(HttpVisitRecordClient::new(http.clone(), &base_url));
    let photos = Arc::new(HttpPhotoClient::new(http, &base_url));

    Ok(create_repository(mode, store, records, photos))
}

fn open_migration_deps(common: &CommonOpts) -> Result<MigrationDeps> {
    let base_url = resolve_base_url(common);
    let store = Arc::new(LocalStore::open(&resolve_db_path(common)?)?);

    let http = reqwest::Client::new();
    let records = Arc::new(HttpVisitRecordClient::new(http.clone(), &base_url));
    let photos = Arc::new(HttpPhotoClient::new(http.clone(), &base_url));
    let status = MigrationStatusService::new(Arc::new(HttpMigrationStatusStore::new(
        http, &base_url,
    )));

    Ok(MigrationDeps::new(status, records, photos, store))
}

async fn cmd_add(
    common: CommonOpts,
    activity_id: String,
    activity_name: String,
    date: Option<String>,
    memo: String,
    photo: Option<String>,
) -> Result<()> {
    let repo = open_repository(&common)?;

    let record = VisitRecord {
        id: Uuid::new_v4().to_string(),
        activity_id,
        activity_name,
        date: date.unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string()),
        memo,
        photo: photo.map(Photo::from_raw),
    };

    let list = repo.append(&common.user, &record).await?;
    println!("Added visit {} ({} total)", record.id, list.len());
    Ok(())
}

async fn cmd_list(common: CommonOpts) -> Result<()> {
    let repo = open_repository(&common)?;
    let records = repo.load(&common.user).await?;

    if records.is_empty() {
        println!("No visits recorded.");
        return Ok(());
    }

    for record in &records {
        let photo_marker = match &record.photo {
            Some(Photo::Inline(_)) => " [photo]",
            Some(Photo::Stored(_)) => " [photo: stored]",
            None => "",
        };
        println!(
            "{}  {}  {}{}",
            record.id, record.date, record.activity_name, photo_marker
        );
        if !record.memo.is_empty() {
            println!("    {}", record.memo);
        }
    }
    println!("{} visit(s)", records.len());
    Ok(())
}

async fn cmd_remove(common: CommonOpts, id: String) -> Result<()> {
    let repo = open_repository(&common)?;
    let list = repo.remove(&common.user, &id).await?;
    println!("Removed {} ({} remaining)", id, list.len());
    Ok(())
}

async fn cmd_clear(common: CommonOpts) -> Result<()> {
    let repo = open_repository(&common)?;
    repo.clear(&common.user).await?;
    println!("Visit history cleared.");
    Ok(())
}

async fn cmd_migrate(common: CommonOpts) -> Result<()> {
    let deps = open_migration_deps(&common)?;
    let result = run_migration_if_needed(&common.user, &deps).await?;

    if result.skipped {
        println!("Migration skipped (state: {:?})", result.status.state);
    } else {
        println!(
            "Migration attempt {}: {} migrated, {} failed (state: {:?})",
            result.status.attempts,
            result.migrated_count,
            result.failed_count,
            result.status.state
        );
    }

    if result.should_notify {
        eprintln!("Migration has permanently failed; local records were not fully transferred.");
        for item in &result.status.failed_items {
            eprintln!("  {}: {}", item.record_id, item.reason);
        }
    }
    Ok(())
}

async fn cmd_status(common: CommonOpts) -> Result<()> {
    let deps = open_migration_deps(&common)?;
    let status = deps.status.get(&common.user).await?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

fn cmd_mode(common: CommonOpts) -> Result<()> {
    println!("{}", resolve_mode(&common).as_str());
    Ok(())
}
