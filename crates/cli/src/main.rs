//! Rebuild Together CLI - migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! rt-cli migrate
//!
//! # Generate annual tax receipts for last year
//! rt-cli receipts annual --year 2025
//!
//! # Generate a single donor's annual receipt
//! rt-cli receipts annual --year 2025 --donor 3fa85f64-5717-4562-b3fc-2c963f66afa6
//!
//! # Grant or revoke the admin role
//! rt-cli roles grant --user 3fa85f64-5717-4562-b3fc-2c963f66afa6 --role admin
//! rt-cli roles revoke --user 3fa85f64-5717-4562-b3fc-2c963f66afa6 --role admin
//! ```
//!
//! # Commands
//!
//! - `migrate` - Apply database migrations
//! - `receipts annual` - Generate yearly donation summaries
//! - `roles` - Manage user roles

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "rt-cli")]
#[command(author, version, about = "Rebuild Together operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply database migrations
    Migrate,
    /// Generate tax receipts
    Receipts {
        #[command(subcommand)]
        action: ReceiptAction,
    },
    /// Manage user roles
    Roles {
        #[command(subcommand)]
        action: RoleAction,
    },
}

#[derive(Subcommand)]
enum ReceiptAction {
    /// Generate annual receipts for every donor, or a single donor
    Annual {
        /// Calendar year (defaults to the current year)
        #[arg(short, long)]
        year: Option<i32>,

        /// Only generate for this donor id
        #[arg(short, long)]
        donor: Option<String>,
    },
}

#[derive(Subcommand)]
enum RoleAction {
    /// Grant a role to a user
    Grant {
        /// User id
        #[arg(short, long)]
        user: String,

        /// Role (`admin`, `donor`)
        #[arg(short, long, default_value = "admin")]
        role: String,
    },
    /// Revoke a role from a user
    Revoke {
        /// User id
        #[arg(short, long)]
        user: String,

        /// Role (`admin`, `donor`)
        #[arg(short, long, default_value = "admin")]
        role: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Receipts { action } => match action {
            ReceiptAction::Annual { year, donor } => {
                commands::receipts::annual(year, donor.as_deref()).await?;
            }
        },
        Commands::Roles { action } => match action {
            RoleAction::Grant { user, role } => commands::roles::grant(&user, &role).await?,
            RoleAction::Revoke { user, role } => commands::roles::revoke(&user, &role).await?,
        },
    }
    Ok(())
}
