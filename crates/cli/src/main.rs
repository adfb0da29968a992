//! Gatehouse CLI - operator tasks from the command line
//!
//! Usage:
//! ```bash
//! gatehouse init
//! gatehouse promote user_2abc
//! gatehouse users --status pending
//! gatehouse decide req_123 user_2abc approve --admin user_admin
//! gatehouse apps add --name Wiki --description "Team wiki" --url https://wiki.example.com
//! gatehouse stats
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use gatehouse_core::{AccessStatus, Decision};
use tracing_subscriber::EnvFilter;

mod commands;
mod db;

use commands::{apps, users};

/// Gatehouse - approval-gated access to an application catalog
#[derive(Parser)]
#[command(name = "gatehouse")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Database URL
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = gatehouse_persistence::DEFAULT_DATABASE_URL,
        global = true
    )]
    pub database: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database and run migrations
    Init,

    /// Grant the admin role to a user
    Promote {
        /// Identity key of the user
        user_id: String,
    },

    /// List users, newest first
    Users {
        /// Filter by status
        #[arg(long, short)]
        status: Option<StatusArg>,
        /// Page number
        #[arg(long, default_value_t = 1)]
        page: i64,
        /// Page size
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },

    /// Approve or reject a pending approval request
    Decide {
        /// Approval request ID
        request_id: String,
        /// Identity key of the requesting user
        user_id: String,
        /// Decision
        action: DecisionArg,
        /// Notes recorded on rejection
        #[arg(long)]
        notes: Option<String>,
        /// Identity key of the deciding admin
        #[arg(long)]
        admin: String,
    },

    /// Catalog management
    Apps {
        #[command(subcommand)]
        action: AppsAction,
    },

    /// Show portal statistics
    Stats,
}

#[derive(Subcommand)]
pub enum AppsAction {
    /// List all catalog entries
    List,
    /// Add a catalog entry
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        url: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        icon_url: Option<String>,
    },
    /// Make an entry available to future approvals
    Enable { app_id: String },
    /// Stop granting an entry on approval
    Disable { app_id: String },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum StatusArg {
    Pending,
    Approved,
    Rejected,
}

impl StatusArg {
    pub fn to_core_status(&self) -> AccessStatus {
        match self {
            StatusArg::Pending => AccessStatus::Pending,
            StatusArg::Approved => AccessStatus::Approved,
            StatusArg::Rejected => AccessStatus::Rejected,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DecisionArg {
    Approve,
    Reject,
}

impl DecisionArg {
    pub fn to_core_decision(&self) -> Decision {
        match self {
            DecisionArg::Approve => Decision::Approve,
            DecisionArg::Reject => Decision::Reject,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            db::init_database(&cli.database).await?;
            println!("✅ Database initialized at {}", cli.database);
        }

        Commands::Promote { user_id } => {
            users::promote(&cli.database, &user_id).await?;
        }

        Commands::Users {
            status,
            page,
            limit,
        } => {
            users::list(&cli.database, status, page, limit).await?;
        }

        Commands::Decide {
            request_id,
            user_id,
            action,
            notes,
            admin,
        } => {
            users::decide(
                &cli.database,
                &request_id,
                &user_id,
                action,
                notes.as_deref(),
                &admin,
            )
            .await?;
        }

        Commands::Apps { action } => {
            apps::handle(&cli.database, action).await?;
        }

        Commands::Stats => {
            users::stats(&cli.database).await?;
        }
    }

    Ok(())
}
