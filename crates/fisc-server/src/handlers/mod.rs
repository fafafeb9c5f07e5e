//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod auth;
pub mod budgets;
pub mod courses;
pub mod extraction;
pub mod plans;
pub mod records;
pub mod users;

// Re-export all handlers for use in router
pub use auth::*;
pub use budgets::*;
pub use courses::*;
pub use extraction::*;
pub use plans::*;
pub use records::*;
pub use users::*;

use serde_json::{Map, Value};

use fisc_core::models::AppUser;

/// Record attributes of a user projection, for ability condition checks
pub(crate) fn user_attrs(user: &AppUser) -> Map<String, Value> {
    let mut attrs = Map::new();
    attrs.insert("id".to_string(), Value::from(user.id));
    attrs
}

/// Record attributes of an owned document, for ability condition checks
pub(crate) fn record_attrs(owner_id: i64) -> Map<String, Value> {
    let mut attrs = Map::new();
    attrs.insert("owner_id".to_string(), Value::from(owner_id));
    attrs
}
