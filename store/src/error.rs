pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by [`crate::SessionStore`] operations.
///
/// A missing or expired session is not an error: `find` returns `Ok(None)` and `delete` succeeds.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An error occured while interacting with the database.
    #[error("an error occured while interacting with the database")]
    Database(#[from] sessionstore_db::Error),
    /// A backend other than the bundled SQLite one failed.
    #[error("session backend failed: {0}")]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}
