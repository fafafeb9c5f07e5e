//! User account management commands
//!
//! Role changes happen here and nowhere else reachable by a user: the
//! web API refuses self-service role edits, so the first superadmin is
//! always promoted from the operator's shell.

use anyhow::{anyhow, Context, Result};

use fisc_core::models::{AppUser, Role, UserStatus};
use fisc_core::store::Store;

fn find_by_email(store: &Store, email: &str) -> Result<AppUser> {
    store
        .find_user_by_email(email)?
        .ok_or_else(|| anyhow!("No account with email {} (users sign in via the web first)", email))
}

pub fn cmd_users_list(store: &Store) -> Result<()> {
    let users = store.list_users().context("Failed to list users")?;

    if users.is_empty() {
        println!("No user accounts yet (accounts are created on first sign-in)");
        return Ok(());
    }

    println!();
    println!(
        "  {:<5} {:<30} {:<20} {:<12} {:<10}",
        "ID", "EMAIL", "NAME", "ROLE", "STATUS"
    );
    for user in users {
        println!(
            "  {:<5} {:<30} {:<20} {:<12} {:<10}",
            user.id,
            user.email,
            user.display_name,
            user.role.as_str(),
            user.status.as_str()
        );
    }
    println!();
    Ok(())
}

pub fn cmd_users_set_role(store: &Store, email: &str, role: &str) -> Result<()> {
    let role: Role = role.parse().map_err(|e: String| anyhow!(e))?;
    let user = find_by_email(store, email)?;

    store
        .set_user_role(user.id, role)
        .context("Failed to update role")?;
    println!("✅ {} is now {}", email, role);
    Ok(())
}

pub fn cmd_users_set_status(store: &Store, email: &str, status: &str) -> Result<()> {
    let status: UserStatus = status.parse().map_err(|e: String| anyhow!(e))?;
    let user = find_by_email(store, email)?;

    store
        .set_user_status(user.id, status)
        .context("Failed to update status")?;
    println!("✅ {} is now {}", email, status.as_str());
    Ok(())
}
