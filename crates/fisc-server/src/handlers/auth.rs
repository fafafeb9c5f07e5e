//! Authentication-related handlers

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, Json};
use serde::Deserialize;

use fisc_core::ability::{AbilitySet, Action, SubjectKind, SubjectRef};
use fisc_core::models::AppUser;

use super::user_attrs;
use crate::{require_can, require_user, AppError, AppState};

/// GET /api/me - the currently authenticated principal
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AppUser>, AppError> {
    let me = require_user(&state, &headers)?;
    Ok(Json(me))
}

/// Profile edit request (role and status are not profile fields and
/// have no path through this endpoint)
#[derive(Debug, Deserialize)]
pub struct UpdateMeRequest {
    pub display_name: String,
}

/// PUT /api/me - edit own profile
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<UpdateMeRequest>,
) -> Result<Json<AppUser>, AppError> {
    let me = require_user(&state, &headers)?;

    if request.display_name.trim().is_empty() {
        return Err(AppError::bad_request("display_name must not be empty"));
    }

    let abilities = AbilitySet::for_user(Some(&me));
    let attrs = user_attrs(&me);
    require_can(
        &abilities,
        Action::Update,
        SubjectRef::record(SubjectKind::User, &attrs),
        Some("display_name"),
    )?;

    let updated = state
        .store
        .set_user_display_name(me.id, request.display_name.trim())?;
    Ok(Json(updated))
}
