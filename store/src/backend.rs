use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sessionstore_db::{DbPool, entities::session::Session};

use crate::Result;

/// ------------------------------------------------------------------------
/// # The storage operations a session store is built on
/// ------------------------------------------------------------------------
///
/// Every operation must be atomic on its own; the store adds no locking on top.
/// Comparisons against `now` are strict: a session is valid while `expiry > now`
/// and is swept once `expiry < now`.
///
/// ------------------------------------------------------------------------
#[async_trait]
pub trait SessionBackend: Send + Sync + 'static {
    /// Creates the session table if it does not exist yet.
    async fn create_table(&self) -> Result<()>;

    /// Returns the payload under `token` if its expiry lies after `now`.
    async fn find(&self, token: &str, now: DateTime<Utc>) -> Result<Option<Vec<u8>>>;

    /// Inserts the session or overwrites payload and expiry of an existing one, in a single step.
    async fn upsert(&self, token: &str, data: &[u8], expiry: DateTime<Utc>) -> Result<()>;

    /// Removes the session under `token`. Removing a missing token succeeds.
    async fn delete(&self, token: &str) -> Result<()>;

    /// Removes every session whose expiry lies before `now` and returns how many were removed.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}

/// A [`SessionBackend`] persisting sessions in the `sessions` table of a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    db_pool: DbPool,
}

impl SqliteBackend {
    pub fn new(db_pool: DbPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SessionBackend for SqliteBackend {
    async fn create_table(&self) -> Result<()> {
        Session::create_table(&self.db_pool).await?;
        Ok(())
    }

    async fn find(&self, token: &str, now: DateTime<Utc>) -> Result<Option<Vec<u8>>> {
        let data = Session::try_get_data(token, now, &self.db_pool).await?;
        Ok(data)
    }

    async fn upsert(&self, token: &str, data: &[u8], expiry: DateTime<Utc>) -> Result<()> {
        Session::upsert(token, data, expiry, &self.db_pool).await?;
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<()> {
        Session::delete(token, &self.db_pool).await?;
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let deleted = Session::delete_expired(now, &self.db_pool).await?;
        Ok(deleted)
    }
}
