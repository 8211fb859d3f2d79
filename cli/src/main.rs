//! Accident Portal admin CLI
//!
//! Operator tooling for the traffic accident risk portal: schema
//! migrations, account provisioning, history inspection and offline
//! inference against a model directory.
//!
//! # Usage
//!
//! ```bash
//! accident-portal-admin migrate
//! accident-portal-admin users create --username sara --password secret --language en
//! accident-portal-admin users list --format json
//! accident-portal-admin history --username sara --limit 20
//! accident-portal-admin predict --day Friday --hour 17 --injuries 2 --location "Ring Rd"
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;

mod commands;
mod config;
mod output;

const DEFAULT_DATABASE_URL: &str = "sqlite://accident_portal.db";
const DEFAULT_MODEL_DIR: &str = "models";

#[derive(Parser)]
#[command(name = "accident-portal-admin")]
#[command(version)]
#[command(about = "Traffic accident risk portal administration", long_about = None)]
struct Cli {
    /// sqlx SQLite URL
    #[arg(long, global = true, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Directory holding the model and encoder artifacts
    #[arg(long, global = true, env = "PORTAL_MODEL_DIR")]
    model_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, short, global = true)]
    format: Option<output::OutputFormat>,

    /// Profile name from config file
    #[arg(long, short, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Manage portal accounts
    Users {
        #[command(subcommand)]
        action: UserCommands,
    },
    /// Show recent predictions
    History {
        /// Only predictions made by this user
        #[arg(long)]
        username: Option<String>,
        #[arg(long, default_value_t = 200)]
        limit: u32,
    },
    /// Score one incident offline
    Predict {
        #[arg(long)]
        day: String,
        #[arg(long)]
        hour: u8,
        #[arg(long)]
        injuries: u32,
        #[arg(long)]
        location: String,
    },
    /// List day and location labels known to the model
    Vocab,
    /// Configure CLI
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// List all accounts
    List,
    /// Create an account
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        /// admin | user
        #[arg(long, default_value = "user")]
        role: String,
        /// ar | en
        #[arg(long)]
        language: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Set configuration value
    Set { key: String, value: String },
    /// Get configuration value
    Get { key: String },
    /// List all configuration
    List,
    /// Initialize configuration
    Init,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let profile = cli.profile.as_deref();
    let config = config::Config::load(profile).unwrap_or_else(|e| {
        eprintln!("{} ignoring unreadable profile config: {}", "Warning:".yellow().bold(), e);
        config::Config::default()
    });
    let ctx = match commands::Context::resolve(cli.database_url, cli.model_dir, cli.format, &config) {
        Ok(ctx) => ctx,
        Err(e) => fail(&e),
    };

    let result = match cli.command {
        Commands::Migrate => commands::migrate(&ctx).await,
        Commands::Users { action } => commands::users::handle(action, &ctx).await,
        Commands::History { username, limit } => {
            commands::history::handle(username.as_deref(), limit, &ctx).await
        }
        Commands::Predict { day, hour, injuries, location } => {
            commands::predict::handle(day, hour, injuries, location, &ctx)
        }
        Commands::Vocab => commands::predict::vocab(&ctx),
        Commands::Config { action } => commands::config::handle(action, profile),
    };

    if let Err(e) = result {
        fail(&e);
    }
}

fn fail(message: &str) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), message);
    std::process::exit(1);
}
