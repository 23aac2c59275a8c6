use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use punch_cli::commands::{clock, hours, report, status, users};
use punch_cli::{Cli, Commands, Config, UserAction};

/// Load config and open the database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<punch_db::Database> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    punch_db::Database::open(&config.database_path).context("failed to open database")
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let mut stdout = std::io::stdout();
    let mut db = open_database(cli.config.as_deref())?;

    match &cli.command {
        Commands::In { user } => clock::clock_in(&mut stdout, &mut db, user)?,
        Commands::Pause { user } => clock::pause(&mut stdout, &mut db, user)?,
        Commands::Resume { user } => clock::resume(&mut stdout, &mut db, user)?,
        Commands::Out { user } => clock::clock_out(&mut stdout, &mut db, user)?,
        Commands::Status { user } => status::run(&mut stdout, &db, user)?,
        Commands::Hours { user, json } => hours::run(&mut stdout, &db, user, *json)?,
        Commands::Report { acting, json } => report::run(&mut stdout, &db, acting, *json)?,
        Commands::Month {
            acting,
            user,
            year,
            month,
            json,
        } => report::month(&mut stdout, &db, acting, user, *year, *month, *json)?,
        Commands::User { action } => match action {
            UserAction::Add { id, name, role } => {
                users::add(&mut stdout, &mut db, id, name, *role)?;
            }
            UserAction::List => users::list(&mut stdout, &db)?,
            UserAction::Remove { id } => users::remove(&mut stdout, &mut db, id)?,
        },
    }

    Ok(())
}
