//! # Badgetrack CLI Module
//!
//! ## Available Commands
//!
//! - `serve` - Start the HTTP server
//! - `init` - Create or reset the super-admin account
//! - `status` - Show document counts
//! - `users` - List accounts
//! - `categories` - List categories with badge counts
//! - `compact` - Compact the database file

mod commands;

use crate::config::AppConfig;
use badgetrack_core::{Role, TrackerError};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Badgetrack - school badge tracking server
///
/// Teachers define badges, students submit evidence, staff review it.
#[derive(Parser, Debug)]
#[command(name = "badgetrack")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML configuration file
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the redb database (overrides configuration)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create the super-admin account, or reset its password
    Init {
        /// Display name of the account
        #[arg(short, long, default_value = "Administrator")]
        name: String,

        /// Initial password
        #[arg(long, env = "BADGETRACK_SUPER_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Show document counts
    Status,

    /// List user accounts
    Users {
        /// Only show accounts with this role (student, teacher, admin)
        #[arg(short, long)]
        role: Option<Role>,
    },

    /// List categories with their badge counts
    Categories,

    /// Compact the database file
    Compact,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Resolve configuration from file, environment and global flags.
pub fn resolve_config(cli: &Cli) -> Result<AppConfig, TrackerError> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(database) = &cli.database {
        config.database.clone_from(database);
    }
    Ok(config)
}

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), TrackerError> {
    let mut config = resolve_config(&cli)?;
    let json_mode = cli.json_mode;

    if cli.verbose {
        tracing::debug!(?config, "Resolved configuration");
    }

    match cli.command {
        Some(Commands::Serve { host, port }) => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            cmd_serve(&config).await
        }
        Some(Commands::Init { name, password }) => cmd_init(&config, &name, &password, json_mode),
        Some(Commands::Status) => cmd_status(&config, json_mode),
        Some(Commands::Users { role }) => cmd_users(&config, role, json_mode),
        Some(Commands::Categories) => cmd_categories(&config, json_mode),
        Some(Commands::Compact) => cmd_compact(&config),
        // No subcommand - show status by default
        None => cmd_status(&config, json_mode),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serve_overrides() {
        let cli = Cli::parse_from(["badgetrack", "serve", "-H", "0.0.0.0", "-p", "9000"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Serve {
                host: Some(ref h),
                port: Some(9000),
            }) if h == "0.0.0.0"
        ));
    }

    #[test]
    fn database_flag_overrides_config() {
        let cli = Cli::parse_from(["badgetrack", "--database", "/tmp/other.redb", "status"]);
        let config = resolve_config(&cli).expect("config");
        assert_eq!(config.database, PathBuf::from("/tmp/other.redb"));
    }

    #[test]
    fn users_role_filter_parses() {
        let cli = Cli::parse_from(["badgetrack", "users", "--role", "teacher"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Users {
                role: Some(Role::Teacher)
            })
        ));
    }
}
