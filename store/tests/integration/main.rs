mod cleanup_test;

use std::sync::OnceLock;

use sessionstore::{SessionStore, SqliteBackend};
use sessionstore_db::DbPool;
use tracing_subscriber::EnvFilter;

fn lazy_tracing() {
    static TRACING: OnceLock<()> = OnceLock::new();
    TRACING.get_or_init(|| {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .init()
    });
}

/// Builds a store on top of the per-test database provisioned by [`sqlx::test`].
///
/// Set `TEST_LOG` to see the store's tracing output.
pub fn test_store(pool: DbPool) -> SessionStore<SqliteBackend> {
    if std::env::var("TEST_LOG").is_ok() {
        lazy_tracing();
    }

    SessionStore::new(SqliteBackend::new(pool))
}
