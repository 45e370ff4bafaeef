//! Productivity Tracker
//!
//! REST backend for personal task tracking with goal/note context and
//! LLM-generated task suggestions.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::io::{BufRead, Write};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use productivity_tracker::api::{self, AppState};
use productivity_tracker::cli::{Cli, Command};
use productivity_tracker::config::Config;
use productivity_tracker::db::Database;
use productivity_tracker::logging;

/// Resolve configuration: file, then environment, then command-line flags.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load_or_default(cli.config.as_deref().map(Path::new))?;

    if let Some(db) = &cli.database {
        config.database.path = PathBuf::from(db);
    }
    if let Some(host) = &cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    Ok(config)
}

fn open_database(config: &Config) -> Result<Database> {
    config.ensure_db_dir()?;
    let db = Database::open(&config.database.path).with_context(|| {
        format!(
            "Failed to open database at {}",
            config.database.path.display()
        )
    })?;
    info!(path = %config.database.path.display(), "Database ready");
    Ok(db)
}

async fn serve(config: Config) -> Result<()> {
    let host: IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("Invalid host address '{}'", config.server.host))?;
    let addr = SocketAddr::new(host, config.server.port);

    if config.auth.secret_key == Config::default().auth.secret_key {
        warn!("Using the built-in SECRET_KEY; set SECRET_KEY outside development");
    }

    let db = open_database(&config)?;
    let state = AppState::from_config(config, db)?;
    let (shutdown_tx, bound, server) = api::start_server(state, addr).await?;
    info!(address = %bound, "Productivity Tracker API started");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    let _ = shutdown_tx.send(());
    server.await?;
    info!("Application shutdown");
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    eprint!("{} [y/N] ", prompt);
    std::io::stderr().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn reset_db(config: &Config, yes: bool) -> Result<()> {
    if !yes
        && !confirm(&format!(
            "Delete all data in {}?",
            config.database.path.display()
        ))?
    {
        eprintln!("Aborted.");
        return Ok(());
    }

    let db = open_database(config)?;
    db.reset()?;
    eprintln!("Database reset: {}", config.database.path.display());
    Ok(())
}

async fn check_ai(config: Config) -> Result<()> {
    // The probe never touches the database.
    let db = Database::open_in_memory()?;
    let state = AppState::from_config(config, db)?;

    if !state.suggestions.is_available() {
        bail!("No language model configured (set GOOGLE_API_KEY)");
    }
    if !state.suggestions.validate_connection().await {
        bail!(
            "Language model '{}' did not respond",
            state.suggestions.model_name().unwrap_or_default()
        );
    }
    println!(
        "Language model '{}' is reachable",
        state.suggestions.model_name().unwrap_or_default()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&cli.log, cli.verbose)?;

    let config = load_config(&cli)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::ResetDb { yes } => reset_db(&config, yes),
        Command::CheckAi => check_ai(config).await,
    }
}
