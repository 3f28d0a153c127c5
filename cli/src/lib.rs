//! The sessionstore-cli crate implements the `sessions` maintenance tool for the session database.

/// Subscriber set-up for the CLI's log output.
pub mod tracing;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] sessionstore_config::Error),
    #[error("Database error")]
    Database(#[from] sessionstore_db::Error),
    #[error("Session store error")]
    Store(#[from] sessionstore::Error),
    #[error("Filesystem io error")]
    Io(#[from] std::io::Error),
    #[error("Other error")]
    Other(#[from] color_eyre::Report),
}
