use chrono::Utc;
use clap::{Parser, Subcommand};
use color_eyre::{
    Result,
    eyre::{Context as _, eyre},
};
use sessionstore::{SessionStore, SqliteBackend};
use sessionstore_cli::{Error, tracing::Tracing};
use sessionstore_config::{Config, Environment, load_config, parse_env};
use sessionstore_db::{
    DbPool, connect_pool, create_database_if_not_exists, entities::session::Session, migrate,
};
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    let config: Config = load_config(&args.env).wrap_err("cannot load configuration")?;

    if !args.quiet {
        Tracing::init(&config.tracing);
    }

    cli(args, &config).await?;

    Ok(())
}

#[derive(Parser)]
#[command(author, version, about = "A CLI tool to maintain the session database.", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true, help = "Choose the environment (development, test, production).", value_parser = parse_env, default_value = "development")]
    env: Environment,

    #[arg(long, global = true, help = "Disable log output.")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Create the database if missing and apply all migrations")]
    Migrate,
    #[command(about = "Delete all expired sessions once")]
    Sweep,
    #[command(about = "Show the number of stored and expired sessions")]
    Stats,
    #[command(about = "Run the background cleanup until interrupted")]
    Run,
}

async fn cli(cli: Cli, config: &Config) -> Result<(), Error> {
    match cli.command {
        Commands::Migrate => {
            create_database_if_not_exists(&config.database)
                .await
                .context("Could not create database!")?;
            let db_pool = connect_pool(&config.database).await?;
            migrate(&db_pool)
                .await
                .context("Could not migrate database!")?;
            println!("Migrated {} database {}.", cli.env, config.database.url);
            Ok(())
        }
        Commands::Sweep => {
            let store = open_store(config).await?;
            let deleted = store.delete_expired().await?;
            println!("Removed {deleted} expired sessions.");
            Ok(())
        }
        Commands::Stats => {
            let db_pool = connect_pool(&config.database).await?;
            let total = Session::count(&db_pool).await?;
            let expired = Session::count_expired(Utc::now(), &db_pool).await?;
            println!("{total} sessions stored, {expired} expired.");
            Ok(())
        }
        Commands::Run => {
            let store = open_store(config)
                .await?
                .with_cleanup_config(&config.cleanup);

            let Some(cleanup_task) = store.start_cleanup() else {
                warn!(
                    interval_secs = config.cleanup.interval_secs,
                    "session cleanup is disabled, nothing to run"
                );
                return Ok(());
            };

            info!(
                interval_secs = config.cleanup.interval_secs,
                "session cleanup running, press Ctrl+C to stop"
            );

            let signal_result = shutdown_signal().await;

            store.stop_cleanup();
            cleanup_task
                .await
                .map_err(|e| eyre!(e).wrap_err("session cleanup task failed"))?;

            info!("session cleanup shut down successfully");

            signal_result
        }
    }
}

async fn open_store(config: &Config) -> Result<SessionStore<SqliteBackend>, Error> {
    let db_pool: DbPool = connect_pool(&config.database).await?;
    let store = SessionStore::new(SqliteBackend::new(db_pool));
    store.create_table().await?;
    Ok(store)
}

async fn shutdown_signal() -> Result<(), Error> {
    let ctrl_c = signal::ctrl_c();

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())?
            .recv()
            .await;
        Ok::<(), std::io::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<std::io::Result<()>>();

    tokio::select! {
        result = ctrl_c => result?,
        result = terminate => result?,
    }

    Ok(())
}
