//! Fisc CLI - Personal finance assistant
//!
//! Usage:
//!   fisc init                     Initialize the document store
//!   fisc serve --port 3000        Start the web server
//!   fisc users list               List user accounts
//!   fisc extract payslip -f PDF   Extract structured payslip data

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let db_path = cli.db.clone().unwrap_or_else(commands::default_db_path);

    match cli.command {
        Commands::Init => commands::cmd_init(&db_path),
        Commands::Status => commands::cmd_status(&db_path).await,
        Commands::Serve {
            port,
            host,
            no_auth,
        } => commands::cmd_serve(&db_path, &host, port, no_auth).await,
        Commands::Users { action } => {
            let store = commands::open_store(&db_path)?;
            match action {
                None => commands::cmd_users_list(&store),
                Some(UsersAction::List) => commands::cmd_users_list(&store),
                Some(UsersAction::SetRole { email, role }) => {
                    commands::cmd_users_set_role(&store, &email, &role)
                }
                Some(UsersAction::SetStatus { email, status }) => {
                    commands::cmd_users_set_status(&store, &email, &status)
                }
            }
        }
        Commands::Extract { action } => {
            let client = commands::model_client()?;
            match action {
                ExtractAction::Payslip { file } => {
                    commands::cmd_extract_payslip(&client, &file).await
                }
                ExtractAction::Statement { file } => {
                    commands::cmd_extract_statement(&client, &file).await
                }
            }
        }
    }
}
