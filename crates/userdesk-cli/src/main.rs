//! Userdesk CLI - Admin console for user accounts
//!
//! A command-line interface for managing user accounts against the
//! userdesk backend: authentication, CRUD, reports, and dashboards.

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "userdesk")]
#[command(author, version, about = "User account administration CLI", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format: table (default) or json
    #[arg(long, global = true, default_value = "table")]
    format: output::OutputFormat,

    /// Suppress progress messages
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Backend base URL (or set USERDESK_API_URL env var)
    #[arg(long, env = "USERDESK_API_URL", global = true, default_value = "http://localhost:8080")]
    api_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store a session token
    Login {
        /// Username (prompted for the password)
        username: String,
    },

    /// Discard the stored session
    Logout,

    /// Show the currently logged-in user
    Whoami,

    /// Manage user accounts
    Users {
        #[command(subcommand)]
        action: commands::users::UsersAction,
    },

    /// Dashboard statistics and recent signups
    Dashboard,

    /// User reports and CSV export
    Report {
        #[command(subcommand)]
        action: commands::report::ReportAction,
    },

    /// Reset the current user's password
    Password,

    /// Check backend connectivity
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let session = userdesk_core::SessionStore::open();
    let client = userdesk_core::ApiClient::new(&cli.api_url, session)?;

    // Create context for commands
    let ctx = commands::Context {
        client,
        format: cli.format,
        quiet: cli.quiet,
    };

    // Execute command
    match cli.command {
        Commands::Login { username } => commands::auth::login(&ctx, &username).await,
        Commands::Logout => commands::auth::logout(&ctx),
        Commands::Whoami => commands::auth::whoami(&ctx),
        Commands::Users { action } => commands::users::execute(&ctx, action).await,
        Commands::Dashboard => commands::dashboard::execute(&ctx).await,
        Commands::Report { action } => commands::report::execute(&ctx, action).await,
        Commands::Password => commands::password::execute(&ctx).await,
        Commands::Status => commands::status::execute(&ctx).await,
    }
}
