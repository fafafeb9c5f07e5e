//! Subscription plan handlers
//!
//! Plans are admin-managed and world-readable. Checkout hands off to
//! the external payment gateway and returns the redirect URL.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use tracing::info;

use fisc_core::ability::{AbilitySet, Action, SubjectKind, SubjectRef};
use fisc_core::models::Plan;
use fisc_core::payments::CheckoutPreference;

use crate::{require_can, require_user, AppError, AppState};

const PLANS_COLLECTION: &str = "plans";

fn plan_from_document(id: i64, body: serde_json::Value) -> Result<Plan, AppError> {
    let mut plan: Plan = serde_json::from_value(body)
        .map_err(|e| AppError::internal(&format!("Malformed plan document: {}", e)))?;
    plan.id = Some(id);
    Ok(plan)
}

fn validate_plan(plan: &Plan) -> Result<(), AppError> {
    if plan.name.trim().is_empty() {
        return Err(AppError::bad_request("Plan name must not be empty"));
    }
    if plan.price <= 0.0 {
        return Err(AppError::bad_request("Plan price must be positive"));
    }
    if plan.currency.trim().is_empty() {
        return Err(AppError::bad_request("Plan currency must not be empty"));
    }
    Ok(())
}

/// GET /api/plans - all plans
pub async fn list_plans(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Plan>>, AppError> {
    require_user(&state, &headers)?;
    let plans = state
        .store
        .read(PLANS_COLLECTION)?
        .into_iter()
        .map(|doc| plan_from_document(doc.id, doc.body))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(plans))
}

/// POST /api/plans - create a plan (admin)
pub async fn create_plan(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(mut plan): Json<Plan>,
) -> Result<(StatusCode, Json<Plan>), AppError> {
    let me = require_user(&state, &headers)?;
    let abilities = AbilitySet::for_user(Some(&me));
    require_can(
        &abilities,
        Action::Create,
        SubjectRef::kind(SubjectKind::Plan),
        None,
    )?;
    validate_plan(&plan)?;

    plan.id = None;
    let id = state.store.write(PLANS_COLLECTION, &serde_json::to_value(&plan)?)?;
    plan.id = Some(id);
    info!(plan = %plan.name, created_by = %me.email, "Plan created");
    Ok((StatusCode::CREATED, Json(plan)))
}

/// PUT /api/plans/:id - update a plan (admin)
pub async fn update_plan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(mut plan): Json<Plan>,
) -> Result<Json<Plan>, AppError> {
    let me = require_user(&state, &headers)?;
    let abilities = AbilitySet::for_user(Some(&me));
    require_can(
        &abilities,
        Action::Update,
        SubjectRef::kind(SubjectKind::Plan),
        None,
    )?;
    validate_plan(&plan)?;

    plan.id = Some(id);
    state
        .store
        .update(PLANS_COLLECTION, id, &serde_json::to_value(&plan)?)?;
    Ok(Json(plan))
}

/// DELETE /api/plans/:id - remove a plan (admin)
pub async fn delete_plan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let me = require_user(&state, &headers)?;
    let abilities = AbilitySet::for_user(Some(&me));
    require_can(
        &abilities,
        Action::Delete,
        SubjectRef::kind(SubjectKind::Plan),
        None,
    )?;

    state.store.delete(PLANS_COLLECTION, id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/plans/:id/checkout - create a checkout preference for the
/// caller and return the gateway redirect
pub async fn create_checkout(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<CheckoutPreference>, AppError> {
    let me = require_user(&state, &headers)?;
    let doc = state
        .store
        .get(PLANS_COLLECTION, id)?
        .ok_or_else(|| AppError::not_found("Plan not found"))?;
    let plan = plan_from_document(doc.id, doc.body)?;

    let preference = state.checkout.create_preference(&plan, &me).await?;
    info!(plan = %plan.name, user = %me.email, "Checkout started");
    Ok(Json(preference))
}
