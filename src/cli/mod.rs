//! CLI command definitions for productivity-tracker
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use clap::{Parser, Subcommand};

/// Productivity Tracker API server and maintenance tools
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Address to bind (overrides config)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start the API server (default if no subcommand given)
    Serve,

    /// Drop all users and tasks and recreate the schema
    ResetDb {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Send a test prompt to the configured language model
    CheckAi,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_serve() {
        let cli = Cli::parse_from(["productivity-tracker"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.log, "2");
        assert!(!cli.verbose);
    }

    #[test]
    fn test_global_overrides() {
        let cli = Cli::parse_from([
            "productivity-tracker",
            "serve",
            "--port",
            "9001",
            "--database",
            "/tmp/t.db",
        ]);
        assert_eq!(cli.command, Some(Command::Serve));
        assert_eq!(cli.port, Some(9001));
        assert_eq!(cli.database.as_deref(), Some("/tmp/t.db"));
    }

    #[test]
    fn test_reset_db_flag() {
        let cli = Cli::parse_from(["productivity-tracker", "reset-db", "--yes"]);
        assert_eq!(cli.command, Some(Command::ResetDb { yes: true }));
    }
}
