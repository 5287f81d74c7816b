//! Store creation and utility functions.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use instructable::store::{InMemoryStore, SqlxStore, UserStore};

use crate::cli::{Backend, StoreArgs};

/// SQLite database file inside the data directory.
pub const SQLITE_FILE: &str = "instructable.db";

/// In-memory store snapshot inside the data directory.
pub const SNAPSHOT_FILE: &str = "instructable.json";

/// Redact credentials from a PostgreSQL connection URL for safe logging
pub fn redact_postgres_url(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        let mut redacted = parsed.clone();
        if !parsed.username().is_empty() {
            let _ = redacted.set_username("***");
        }
        if parsed.password().is_some() {
            let _ = redacted.set_password(Some("***"));
        }
        redacted.to_string()
    } else {
        "postgres://***@<unparsable-url>".to_string()
    }
}

pub fn data_dir(args: &StoreArgs) -> PathBuf {
    args.data_dir.clone().unwrap_or_else(|| PathBuf::from("."))
}

pub fn snapshot_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SNAPSHOT_FILE)
}

/// Open the user store selected on the command line
pub async fn create_store(
    args: &StoreArgs,
) -> Result<Arc<dyn UserStore>, Box<dyn std::error::Error>> {
    let data_dir = data_dir(args);

    // Ensure data directory exists
    tokio::fs::create_dir_all(&data_dir).await?;

    match args.backend {
        Backend::Sqlite => {
            let db_path = data_dir.join(SQLITE_FILE);
            tracing::info!("Using SQLite store at {}", db_path.display());
            Ok(Arc::new(SqlxStore::open_sqlite(&db_path).await?))
        }
        Backend::Postgres => {
            let url = args
                .postgres_url
                .as_ref()
                .ok_or("PostgreSQL backend requires --postgres-url or INSTRUCTABLE_POSTGRES_URL")?;

            let display_url = redact_postgres_url(url);
            tracing::info!("Connecting to PostgreSQL store at {}", display_url);

            match SqlxStore::connect_postgres(url).await {
                Ok(store) => {
                    tracing::info!("Connected to PostgreSQL successfully");
                    Ok(Arc::new(store))
                }
                Err(e) => {
                    Err(format!("Failed to connect to PostgreSQL at {display_url}: {e}").into())
                }
            }
        }
        Backend::Inmemory => {
            let json_path = snapshot_path(&data_dir);
            tracing::info!(
                "Using in-memory store with persistence at {}",
                json_path.display()
            );
            let store = InMemoryStore::load_from_file(&json_path).await?;
            Ok(Arc::new(store))
        }
    }
}

/// Write the in-memory store back to its snapshot. A no-op for SQL stores.
pub async fn save_if_in_memory(
    store: &dyn UserStore,
    data_dir: &Path,
) -> Result<bool, Box<dyn std::error::Error>> {
    let Some(in_memory) = store.as_any().downcast_ref::<InMemoryStore>() else {
        return Ok(false);
    };
    let json_path = snapshot_path(data_dir);
    in_memory.save_to_file(&json_path).await?;
    tracing::info!("Users saved to {}", json_path.display());
    Ok(true)
}
