//! User-projection operations
//!
//! The authentication provider owns identities; the store holds a
//! read-mostly projection in the `users` collection. Principals are
//! created here on first sign-in.

use serde_json::{json, Value};

use super::Store;
use crate::error::{Error, Result};
use crate::models::{AppUser, Role, UserStatus};

/// Collection holding principal projections
pub const USERS_COLLECTION: &str = "users";

fn user_from_document(id: i64, body: &Value) -> Result<AppUser> {
    let mut user: AppUser = serde_json::from_value(body.clone())?;
    user.id = id;
    Ok(user)
}

impl Store {
    /// Find a user projection by email
    pub fn find_user_by_email(&self, email: &str) -> Result<Option<AppUser>> {
        let documents = self.read(USERS_COLLECTION)?;
        for doc in documents {
            if doc.body.get("email").and_then(|v| v.as_str()) == Some(email) {
                return Ok(Some(user_from_document(doc.id, &doc.body)?));
            }
        }
        Ok(None)
    }

    /// Get a user projection by id
    pub fn get_user(&self, id: i64) -> Result<Option<AppUser>> {
        match self.get(USERS_COLLECTION, id)? {
            Some(doc) => Ok(Some(user_from_document(doc.id, &doc.body)?)),
            None => Ok(None),
        }
    }

    /// List all user projections
    pub fn list_users(&self) -> Result<Vec<AppUser>> {
        self.read(USERS_COLLECTION)?
            .into_iter()
            .map(|doc| user_from_document(doc.id, &doc.body))
            .collect()
    }

    /// Find a user by email, creating the projection on first sign-in
    pub fn upsert_user(&self, email: &str, display_name: &str) -> Result<AppUser> {
        if let Some(existing) = self.find_user_by_email(email)? {
            return Ok(existing);
        }

        let body = json!({
            "id": 0,
            "email": email,
            "display_name": display_name,
            "role": Role::User,
            "status": UserStatus::Active,
            "created_at": chrono::Utc::now(),
        });
        let id = self.write(USERS_COLLECTION, &body)?;

        self.get_user(id)?
            .ok_or_else(|| Error::NotFound(format!("users/{}", id)))
    }

    /// Update a user's display name (profile edit)
    pub fn set_user_display_name(&self, id: i64, display_name: &str) -> Result<AppUser> {
        let mut user = self
            .get_user(id)?
            .ok_or_else(|| Error::NotFound(format!("users/{}", id)))?;
        user.display_name = display_name.to_string();
        self.update(USERS_COLLECTION, id, &serde_json::to_value(&user)?)?;
        Ok(user)
    }

    /// Set a user's role (operator action, not reachable from the API
    /// for one's own record)
    pub fn set_user_role(&self, id: i64, role: Role) -> Result<AppUser> {
        let mut user = self
            .get_user(id)?
            .ok_or_else(|| Error::NotFound(format!("users/{}", id)))?;
        user.role = role;
        self.update(USERS_COLLECTION, id, &serde_json::to_value(&user)?)?;
        Ok(user)
    }

    /// Remove a user projection
    pub fn delete_user(&self, id: i64) -> Result<()> {
        self.delete(USERS_COLLECTION, id)
    }

    /// Set a user's account status
    pub fn set_user_status(&self, id: i64, status: UserStatus) -> Result<AppUser> {
        let mut user = self
            .get_user(id)?
            .ok_or_else(|| Error::NotFound(format!("users/{}", id)))?;
        user.status = status;
        self.update(USERS_COLLECTION, id, &serde_json::to_value(&user)?)?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sign_in_creates_projection() {
        let store = Store::in_memory().unwrap();
        assert!(store.find_user_by_email("ana@example.com").unwrap().is_none());

        let user = store.upsert_user("ana@example.com", "Ana").unwrap();
        assert_eq!(user.role, Role::User);
        assert_eq!(user.status, UserStatus::Active);
        assert!(user.id > 0);

        // Second sign-in returns the same projection.
        let again = store.upsert_user("ana@example.com", "Ana B.").unwrap();
        assert_eq!(again.id, user.id);
        assert_eq!(again.display_name, "Ana");
    }

    #[test]
    fn test_role_and_status_updates() {
        let store = Store::in_memory().unwrap();
        let user = store.upsert_user("ops@example.com", "Ops").unwrap();

        let promoted = store.set_user_role(user.id, Role::Superadmin).unwrap();
        assert_eq!(promoted.role, Role::Superadmin);

        let suspended = store.set_user_status(user.id, UserStatus::Suspended).unwrap();
        assert_eq!(suspended.status, UserStatus::Suspended);

        let reloaded = store.get_user(user.id).unwrap().unwrap();
        assert_eq!(reloaded.role, Role::Superadmin);
        assert_eq!(reloaded.status, UserStatus::Suspended);
    }

    #[test]
    fn test_display_name_edit() {
        let store = Store::in_memory().unwrap();
        let user = store.upsert_user("ana@example.com", "Ana").unwrap();
        store.set_user_display_name(user.id, "Ana Maria").unwrap();
        let reloaded = store.get_user(user.id).unwrap().unwrap();
        assert_eq!(reloaded.display_name, "Ana Maria");
    }

    #[test]
    fn test_missing_user_is_not_found() {
        let store = Store::in_memory().unwrap();
        assert!(store.get_user(42).unwrap().is_none());
        assert!(matches!(
            store.set_user_role(42, Role::Superadmin).unwrap_err(),
            Error::NotFound(_)
        ));
    }
}
