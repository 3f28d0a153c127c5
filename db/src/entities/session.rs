use chrono::{DateTime, Utc};
use sqlx::{Sqlite, prelude::FromRow};

use crate::Error;

/// A persisted session: an opaque payload stored under a caller-supplied token.
///
/// The expiry is kept as whole Unix seconds plus the nanoseconds within that second,
/// so it is stored exactly as committed and compared as a `(secs, nanos)` pair.
#[derive(Clone, FromRow, Debug)]
pub struct Session {
    /// The token the session is stored under, unique per record.
    pub token: String,
    /// The serialized session payload.
    pub data: Vec<u8>,
    /// Unix timestamp in seconds of the instant after which the session is no longer valid.
    pub expiry_secs: i64,
    /// Nanoseconds past `expiry_secs`.
    pub expiry_nanos: u32,
}

fn split_timestamp(at: DateTime<Utc>) -> (i64, u32) {
    (at.timestamp(), at.timestamp_subsec_nanos())
}

impl Session {
    /// Creates the `sessions` table and its expiry index unless they already exist.
    ///
    /// Mirrors the migration in `db/migrations` for callers that provision the schema at start-up.
    pub async fn create_table(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
    ) -> Result<(), Error> {
        sqlx::raw_sql(
            r#"CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY NOT NULL,
                data BLOB NOT NULL,
                expiry_secs INTEGER NOT NULL,
                expiry_nanos INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS sessions_expiry_idx ON sessions (expiry_secs, expiry_nanos);
            "#,
        )
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Loads the payload stored under `token` if the session is still valid at `now`.
    pub async fn try_get_data(
        token: &str,
        now: DateTime<Utc>,
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
    ) -> Result<Option<Vec<u8>>, Error> {
        let (now_secs, now_nanos) = split_timestamp(now);
        let data = sqlx::query_scalar::<_, Vec<u8>>(
            r#"SELECT data FROM sessions WHERE token = ? AND (expiry_secs, expiry_nanos) > (?, ?)"#,
        )
        .bind(token)
        .bind(now_secs)
        .bind(now_nanos)
        .fetch_optional(executor)
        .await?;

        Ok(data)
    }

    /// Loads the raw record stored under `token`, expired or not.
    pub async fn try_get_by_token(
        token: &str,
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
    ) -> Result<Option<Session>, Error> {
        let session = sqlx::query_as::<_, Session>(
            r#"SELECT token, data, expiry_secs, expiry_nanos FROM sessions WHERE token = ?"#,
        )
        .bind(token)
        .fetch_optional(executor)
        .await?;

        Ok(session)
    }

    /// Inserts a session, or replaces payload and expiry of the existing one with the same token.
    pub async fn upsert(
        token: &str,
        data: &[u8],
        expiry: DateTime<Utc>,
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
    ) -> Result<(), Error> {
        let (expiry_secs, expiry_nanos) = split_timestamp(expiry);
        sqlx::query(
            r#"INSERT INTO sessions (token, data, expiry_secs, expiry_nanos) VALUES (?, ?, ?, ?)
            ON CONFLICT (token) DO UPDATE SET
                data = excluded.data,
                expiry_secs = excluded.expiry_secs,
                expiry_nanos = excluded.expiry_nanos"#,
        )
        .bind(token)
        .bind(data)
        .bind(expiry_secs)
        .bind(expiry_nanos)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Deletes the session stored under `token`, returning the number of removed rows (0 or 1).
    pub async fn delete(
        token: &str,
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
    ) -> Result<u64, Error> {
        let result = sqlx::query(r#"DELETE FROM sessions WHERE token = ?"#)
            .bind(token)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// Deletes every session whose expiry lies strictly before `now`.
    pub async fn delete_expired(
        now: DateTime<Utc>,
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
    ) -> Result<u64, Error> {
        let (now_secs, now_nanos) = split_timestamp(now);
        let result =
            sqlx::query(r#"DELETE FROM sessions WHERE (expiry_secs, expiry_nanos) < (?, ?)"#)
                .bind(now_secs)
                .bind(now_nanos)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// Number of stored sessions, including expired ones not yet swept.
    pub async fn count(executor: impl sqlx::Executor<'_, Database = Sqlite>) -> Result<i64, Error> {
        let count = sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM sessions"#)
            .fetch_one(executor)
            .await?;

        Ok(count)
    }

    /// Number of stored sessions a sweep at `now` would remove.
    pub async fn count_expired(
        now: DateTime<Utc>,
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
    ) -> Result<i64, Error> {
        let (now_secs, now_nanos) = split_timestamp(now);
        let count = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM sessions WHERE (expiry_secs, expiry_nanos) < (?, ?)"#,
        )
        .bind(now_secs)
        .bind(now_nanos)
        .fetch_one(executor)
        .await?;

        Ok(count)
    }
}
