//! Generic CRUD over the personal record collections
//!
//! Expenses, incomes, debts, savings goals and subscriptions share one
//! shape: JSON documents carrying an `owner_id`. The handlers here are
//! collection-agnostic; ownership enforcement comes from the ability
//! engine via the record's attributes.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::Value;

use fisc_core::ability::{AbilitySet, Action, SubjectKind, SubjectRef};
use fisc_core::models::Role;
use fisc_core::store::Document;

use super::record_attrs;
use crate::{require_can, require_user, AppError, AppState};

/// Map a URL collection segment onto its subject type. Unknown
/// collections are a 404, not an empty list.
fn collection_subject(collection: &str) -> Option<SubjectKind> {
    match collection {
        "expenses" => Some(SubjectKind::Expense),
        "incomes" => Some(SubjectKind::Income),
        "debts" => Some(SubjectKind::Debt),
        "goals" => Some(SubjectKind::SavingsGoal),
        "subscriptions" => Some(SubjectKind::Subscription),
        _ => None,
    }
}

fn require_collection(collection: &str) -> Result<SubjectKind, AppError> {
    collection_subject(collection).ok_or_else(|| AppError::not_found("Unknown collection"))
}

fn owner_of(body: &Value) -> i64 {
    body.get("owner_id").and_then(|v| v.as_i64()).unwrap_or(0)
}

/// Stored document as the API presents it: the body with the
/// store-assigned id folded in
fn document_json(doc: Document) -> Value {
    let mut body = doc.body;
    if let Some(obj) = body.as_object_mut() {
        obj.insert("id".to_string(), Value::from(doc.id));
    }
    body
}

/// GET /api/records/:collection - the caller's records (all records
/// for superadmins)
pub async fn list_records(
    State(state): State<Arc<AppState>>,
    Path(collection): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<Value>>, AppError> {
    let me = require_user(&state, &headers)?;
    require_collection(&collection)?;

    let documents = state.store.read(&collection)?;
    let records = documents
        .into_iter()
        .filter(|doc| me.role == Role::Superadmin || owner_of(&doc.body) == me.id)
        .map(document_json)
        .collect();
    Ok(Json(records))
}

/// POST /api/records/:collection - create a record owned by the caller
pub async fn create_record(
    State(state): State<Arc<AppState>>,
    Path(collection): Path<String>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let me = require_user(&state, &headers)?;
    let kind = require_collection(&collection)?;

    let Some(obj) = body.as_object_mut() else {
        return Err(AppError::bad_request("Record must be a JSON object"));
    };
    // Ownership is never client-controlled.
    obj.insert("owner_id".to_string(), Value::from(me.id));
    obj.remove("id");

    let abilities = AbilitySet::for_user(Some(&me));
    let attrs = record_attrs(me.id);
    require_can(
        &abilities,
        Action::Create,
        SubjectRef::record(kind, &attrs),
        None,
    )?;

    let id = state.store.write(&collection, &body)?;
    if let Some(obj) = body.as_object_mut() {
        obj.insert("id".to_string(), Value::from(id));
    }
    Ok((StatusCode::CREATED, Json(body)))
}

/// GET /api/records/:collection/:id - fetch one record
pub async fn get_record(
    State(state): State<Arc<AppState>>,
    Path((collection, id)): Path<(String, i64)>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    require_user(&state, &headers)?;
    require_collection(&collection)?;

    let doc = state
        .store
        .get(&collection, id)?
        .ok_or_else(|| AppError::not_found("Record not found"))?;
    Ok(Json(document_json(doc)))
}

/// PUT /api/records/:collection/:id - replace a record's body
pub async fn update_record(
    State(state): State<Arc<AppState>>,
    Path((collection, id)): Path<(String, i64)>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let me = require_user(&state, &headers)?;
    let kind = require_collection(&collection)?;

    let existing = state
        .store
        .get(&collection, id)?
        .ok_or_else(|| AppError::not_found("Record not found"))?;
    let owner_id = owner_of(&existing.body);

    let abilities = AbilitySet::for_user(Some(&me));
    let attrs = record_attrs(owner_id);
    require_can(
        &abilities,
        Action::Update,
        SubjectRef::record(kind, &attrs),
        None,
    )?;

    let Some(obj) = body.as_object_mut() else {
        return Err(AppError::bad_request("Record must be a JSON object"));
    };
    // Records cannot change hands via update.
    obj.insert("owner_id".to_string(), Value::from(owner_id));
    obj.remove("id");

    state.store.update(&collection, id, &body)?;
    if let Some(obj) = body.as_object_mut() {
        obj.insert("id".to_string(), Value::from(id));
    }
    Ok(Json(body))
}

/// DELETE /api/records/:collection/:id - delete one record
pub async fn delete_record(
    State(state): State<Arc<AppState>>,
    Path((collection, id)): Path<(String, i64)>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let me = require_user(&state, &headers)?;
    let kind = require_collection(&collection)?;

    let existing = state
        .store
        .get(&collection, id)?
        .ok_or_else(|| AppError::not_found("Record not found"))?;

    let abilities = AbilitySet::for_user(Some(&me));
    let attrs = record_attrs(owner_of(&existing.body));
    require_can(
        &abilities,
        Action::Delete,
        SubjectRef::record(kind, &attrs),
        None,
    )?;

    state.store.delete(&collection, id)?;
    Ok(StatusCode::NO_CONTENT)
}
