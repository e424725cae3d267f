/**
 * Server Configuration
 *
 * Selects the storage backend from the loaded [`AppConfig`].
 *
 * With `database_url` set, the server connects to PostgreSQL and runs the
 * embedded migrations; a failed connection or migration is a startup error.
 * Without it, notes and users live in memory for the life of the process.
 */

use std::sync::Arc;

use sqlx::PgPool;

use crate::backend::auth::{MemoryDirectory, PgDirectory, UserDirectory};
use crate::backend::store::{MemoryStore, NoteStore, PgStore};
use crate::shared::AppConfig;

/// Storage handles for the collaborative services
pub type Storage = (Arc<dyn NoteStore>, Arc<dyn UserDirectory>);

/// Connect to PostgreSQL and run migrations
pub async fn load_database(database_url: &str) -> Result<PgPool, sqlx::Error> {
    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(database_url).await?;
    tracing::info!("Database connection pool created successfully");

    tracing::info!("Running database migrations...");
    sqlx::migrate!().run(&pool).await?;
    tracing::info!("Database migrations completed successfully");

    Ok(pool)
}

/// Build the note store and user directory for this configuration
pub async fn load_store(config: &AppConfig) -> Result<Storage, sqlx::Error> {
    match config.database_url.as_deref() {
        Some(url) => {
            let pool = load_database(url).await?;
            Ok((
                Arc::new(PgStore::new(pool.clone())),
                Arc::new(PgDirectory::new(pool)),
            ))
        }
        None => {
            tracing::warn!("DATABASE_URL not set. Notes are kept in memory only.");
            Ok((Arc::new(MemoryStore::new()), Arc::new(MemoryDirectory::new())))
        }
    }
}
