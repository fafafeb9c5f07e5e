//! Server command implementation

use std::path::Path;

use anyhow::Result;

use super::open_store;

/// Environment variable holding comma-separated API keys
pub const API_KEYS_ENV: &str = "FISC_API_KEYS";

/// Environment variable holding comma-separated allowed CORS origins
pub const ALLOWED_ORIGINS_ENV: &str = "FISC_ALLOWED_ORIGINS";

fn split_env_list(name: &str) -> Vec<String> {
    std::env::var(name)
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

pub async fn cmd_serve(db_path: &Path, host: &str, port: u16, no_auth: bool) -> Result<()> {
    println!("🚀 Starting Fisc web server...");
    println!("   Store: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);

    let api_keys = split_env_list(API_KEYS_ENV);
    let allowed_origins = split_env_list(ALLOWED_ORIGINS_ENV);

    if no_auth {
        println!();
        println!("   ⚠️  Authentication DISABLED - do not expose to network!");
    } else {
        println!("   🔒 Authentication: identity headers from the fronting provider");
        if !api_keys.is_empty() {
            println!("   🔑 API keys: {} configured ({})", api_keys.len(), API_KEYS_ENV);
        }
    }
    if !allowed_origins.is_empty() {
        println!("   🌐 CORS origins: {}", allowed_origins.join(", "));
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let store = open_store(db_path)?;

    let config = fisc_server::ServerConfig {
        require_auth: !no_auth,
        allowed_origins,
        api_keys,
    };

    fisc_server::serve(store, host, port, config).await?;

    Ok(())
}
