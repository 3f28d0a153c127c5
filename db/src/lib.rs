use sessionstore_config::DatabaseConfig;
use sqlx::migrate::MigrateDatabase as _;
use sqlx::{Sqlite, sqlite::SqlitePoolOptions};
use tracing::debug;

pub use sqlx::SqlitePool as DbPool;

/// Custom migrator set to the correct path within the testing environment
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../db/migrations");

/// Entity definitions and related general queries.
pub mod entities;

/// Creates a connection pool to the database specified in the passed [`sessionstore_config::DatabaseConfig`]
pub async fn connect_pool(config: &DatabaseConfig) -> Result<DbPool, Error> {
    let pool = SqlitePoolOptions::new().connect(&config.url).await?;

    Ok(pool)
}

/// Create a database if it does not exist.
/// Used for parts of the system where dbs are created
/// at runtime, e.g. the `sessions migrate` command.
pub async fn create_database_if_not_exists(config: &DatabaseConfig) -> Result<(), Error> {
    if !Sqlite::database_exists(&config.url).await? {
        debug!(url = %config.url, "creating session database");
        Sqlite::create_database(&config.url).await?
    };
    Ok(())
}

/// Applies all pending migrations in `db/migrations` to the database behind `db_pool`.
pub async fn migrate(db_pool: &DbPool) -> Result<(), Error> {
    MIGRATOR.run(db_pool).await?;

    Ok(())
}

/// Errors that can occur as a result of a data layer operation.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// General database error, e.g. communicating with the database failed
    #[error("database query failed")]
    DatabaseError(#[from] sqlx::Error),
    /// Applying the schema migrations failed.
    #[error("database migration failed")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
}
