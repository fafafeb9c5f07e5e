//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Init/status commands and shared utilities (open_store)
//! - `extract` - Document extraction commands
//! - `serve` - Web server command
//! - `users` - User account management commands

pub mod core;
pub mod extract;
pub mod serve;
pub mod users;

// Re-export command functions for main.rs
pub use core::*;
pub use extract::*;
pub use serve::*;
pub use users::*;
