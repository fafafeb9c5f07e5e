//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Fisc - Self-hosted personal finance assistant
#[derive(Parser)]
#[command(name = "fisc")]
#[command(about = "Self-hosted personal finance assistant", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Store path (defaults to the platform data directory)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the document store
    Init,

    /// Show store status and backend health
    Status,

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Disable authentication (for local development only)
        ///
        /// WARNING: Do not use this flag when exposing the server to a
        /// network. By default, the server requires identity headers
        /// from the fronting authentication provider.
        #[arg(long)]
        no_auth: bool,
    },

    /// Manage user accounts
    Users {
        #[command(subcommand)]
        action: Option<UsersAction>,
    },

    /// Extract structured data from documents
    Extract {
        #[command(subcommand)]
        action: ExtractAction,
    },
}

#[derive(Subcommand)]
pub enum UsersAction {
    /// List all user accounts
    List,

    /// Change a user's role (the only way to promote a superadmin)
    SetRole {
        /// Email of the account
        #[arg(short, long)]
        email: String,

        /// New role: user, superadmin
        #[arg(short, long)]
        role: String,
    },

    /// Change a user's account status
    SetStatus {
        /// Email of the account
        #[arg(short, long)]
        email: String,

        /// New status: active, suspended
        #[arg(short, long)]
        status: String,
    },
}

#[derive(Subcommand)]
pub enum ExtractAction {
    /// Extract structured data from a payslip PDF
    Payslip {
        /// PDF file to extract from
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Extract transactions from a bank statement PDF
    Statement {
        /// PDF file to extract from
        #[arg(short, long)]
        file: PathBuf,
    },
}
