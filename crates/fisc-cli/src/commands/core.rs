//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `default_db_path` / `open_store` - Shared store utilities
//! - `model_client` - Model backend from environment
//! - `cmd_init` - Initialize the document store
//! - `cmd_status` - Store and backend status

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use fisc_core::ai::{AIClient, ModelBackend};
use fisc_core::store::Store;

/// Default store location: the platform data directory, falling back
/// to the working directory.
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("fisc").join("fisc.db"))
        .unwrap_or_else(|| PathBuf::from("fisc.db"))
}

/// Open the document store, creating parent directories as needed
pub fn open_store(db_path: &Path) -> Result<Store> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let path_str = db_path
        .to_str()
        .context("Store path must be valid UTF-8")?;
    debug!(path = %db_path.display(), "Opening document store");
    Store::open(path_str).context("Failed to open document store")
}

/// Build a model client from environment variables, failing with a
/// setup hint when none is configured.
pub fn model_client() -> Result<AIClient> {
    AIClient::from_env()
        .context("No model backend configured (set OLLAMA_HOST, or AI_BACKEND with its host)")
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing store at {}...", db_path.display());

    open_store(db_path)?;

    println!("✅ Store initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Start the web server: fisc serve");
    println!("  2. Sign in once, then promote yourself:");
    println!("     fisc users set-role --email you@example.com --role superadmin");

    Ok(())
}

pub async fn cmd_status(db_path: &Path) -> Result<()> {
    println!();
    println!("📊 Fisc Status");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Store: {}", db_path.display());

    if db_path.exists() {
        if let Ok(metadata) = std::fs::metadata(db_path) {
            let size_kb = metadata.len() as f64 / 1024.0;
            if size_kb < 1024.0 {
                println!("   Size: {:.1} KB", size_kb);
            } else {
                println!("   Size: {:.1} MB", size_kb / 1024.0);
            }
        }

        match open_store(db_path) {
            Ok(store) => {
                println!();
                println!("   Users: {}", store.count("users")?);
                println!("   Expenses: {}", store.count("expenses")?);
                println!("   Incomes: {}", store.count("incomes")?);
                println!("   Plans: {}", store.count("plans")?);
            }
            Err(e) => {
                println!();
                println!("   ❌ Error opening store: {}", e);
            }
        }
    } else {
        println!("   Size: (store not initialized, run `fisc init`)");
    }

    println!();
    match AIClient::from_env() {
        Some(client) => {
            let reachable = client.health_check().await;
            let marker = if reachable { "✅" } else { "❌" };
            println!(
                "   {} Model backend: {} (model: {})",
                marker,
                client.host(),
                client.model()
            );
            if !reachable {
                println!("      Backend configured but not reachable");
            }
        }
        None => {
            println!("   ⚪ Model backend: not configured (set OLLAMA_HOST to enable)");
        }
    }
    println!();

    Ok(())
}
