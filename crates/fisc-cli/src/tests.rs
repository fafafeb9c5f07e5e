//! CLI command tests

use std::io::Write;

use fisc_core::ai::AIClient;
use fisc_core::models::{Role, UserStatus};
use fisc_core::store::Store;

use crate::commands;

fn setup_test_store() -> Store {
    Store::in_memory().unwrap()
}

// ========== Users Command Tests ==========

#[test]
fn test_cmd_users_list_empty() {
    let store = setup_test_store();
    assert!(commands::cmd_users_list(&store).is_ok());
}

#[test]
fn test_cmd_users_set_role() {
    let store = setup_test_store();
    let user = store.upsert_user("ana@example.com", "Ana").unwrap();

    commands::cmd_users_set_role(&store, "ana@example.com", "superadmin").unwrap();
    let reloaded = store.get_user(user.id).unwrap().unwrap();
    assert_eq!(reloaded.role, Role::Superadmin);
}

#[test]
fn test_cmd_users_set_role_unknown_email() {
    let store = setup_test_store();
    let result = commands::cmd_users_set_role(&store, "ghost@example.com", "superadmin");
    assert!(result.is_err());
}

#[test]
fn test_cmd_users_set_role_invalid_role() {
    let store = setup_test_store();
    store.upsert_user("ana@example.com", "Ana").unwrap();
    let result = commands::cmd_users_set_role(&store, "ana@example.com", "wizard");
    assert!(result.is_err());
}

#[test]
fn test_cmd_users_set_status() {
    let store = setup_test_store();
    let user = store.upsert_user("ana@example.com", "Ana").unwrap();

    commands::cmd_users_set_status(&store, "ana@example.com", "suspended").unwrap();
    let reloaded = store.get_user(user.id).unwrap().unwrap();
    assert_eq!(reloaded.status, UserStatus::Suspended);
}

// ========== Extract Command Tests ==========

#[tokio::test]
async fn test_cmd_extract_payslip() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"%PDF-1.4 payslip").unwrap();

    let client = AIClient::mock();
    let result = commands::cmd_extract_payslip(&client, file.path()).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cmd_extract_statement() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"%PDF-1.4 statement").unwrap();

    let client = AIClient::mock();
    let result = commands::cmd_extract_statement(&client, file.path()).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cmd_extract_missing_file() {
    let client = AIClient::mock();
    let result =
        commands::cmd_extract_payslip(&client, std::path::Path::new("/nonexistent.pdf")).await;
    assert!(result.is_err());
}

// ========== Store Utility Tests ==========

#[test]
fn test_open_store_creates_parent_dirs() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("nested").join("fisc.db");
    let store = commands::open_store(&path).unwrap();
    assert_eq!(store.count("users").unwrap(), 0);
    assert!(path.exists());
}
