//! User administration handlers
//!
//! Every mutation goes through a field-level ability check, so the
//! rules (no self-deletion, no self-service role or status changes)
//! live in one place and the handlers stay thin.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use tracing::info;

use fisc_core::ability::{AbilitySet, Action, SubjectKind, SubjectRef};
use fisc_core::models::{AppUser, Role, UserStatus};

use super::user_attrs;
use crate::{require_can, require_user, AppError, AppState};

/// GET /api/users - all user projections
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<AppUser>>, AppError> {
    require_user(&state, &headers)?;
    let users = state.store.list_users()?;
    Ok(Json(users))
}

/// GET /api/users/:id - one user projection
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<AppUser>, AppError> {
    require_user(&state, &headers)?;
    let user = state
        .store
        .get_user(id)?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(Json(user))
}

/// Admin edit request; absent fields are left untouched
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub display_name: Option<String>,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
}

/// PUT /api/users/:id - edit a user's profile, role or status
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<AppUser>, AppError> {
    let me = require_user(&state, &headers)?;
    let target = state
        .store
        .get_user(id)?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    let abilities = AbilitySet::for_user(Some(&me));
    let attrs = user_attrs(&target);
    let subject = SubjectRef::record(SubjectKind::User, &attrs);

    if let Some(ref display_name) = request.display_name {
        if display_name.trim().is_empty() {
            return Err(AppError::bad_request("display_name must not be empty"));
        }
        require_can(&abilities, Action::Update, subject, Some("display_name"))?;
        state.store.set_user_display_name(id, display_name.trim())?;
    }

    if let Some(role) = request.role {
        require_can(&abilities, Action::Update, subject, Some("role"))?;
        state.store.set_user_role(id, role)?;
        info!(user_id = id, role = %role, changed_by = %me.email, "User role changed");
    }

    if let Some(status) = request.status {
        require_can(&abilities, Action::Update, subject, Some("status"))?;
        state.store.set_user_status(id, status)?;
        info!(user_id = id, status = status.as_str(), changed_by = %me.email, "User status changed");
    }

    let updated = state
        .store
        .get_user(id)?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(Json(updated))
}

/// DELETE /api/users/:id - remove a user projection
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let me = require_user(&state, &headers)?;
    let target = state
        .store
        .get_user(id)?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    let abilities = AbilitySet::for_user(Some(&me));
    let attrs = user_attrs(&target);
    require_can(
        &abilities,
        Action::Delete,
        SubjectRef::record(SubjectKind::User, &attrs),
        None,
    )?;

    state.store.delete_user(id)?;
    info!(user_id = id, deleted_by = %me.email, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}
