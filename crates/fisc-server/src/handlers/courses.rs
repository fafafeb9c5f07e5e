//! Educational content handlers
//!
//! Courses are admin-managed; regular users only see published ones.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use tracing::info;

use fisc_core::ability::{AbilitySet, Action, SubjectKind, SubjectRef};
use fisc_core::models::Course;

use crate::{require_can, require_user, AppError, AppState};

const COURSES_COLLECTION: &str = "courses";

fn course_from_document(id: i64, body: serde_json::Value) -> Result<Course, AppError> {
    let mut course: Course = serde_json::from_value(body)
        .map_err(|e| AppError::internal(&format!("Malformed course document: {}", e)))?;
    course.id = Some(id);
    Ok(course)
}

/// GET /api/courses - published courses (admins see drafts too)
pub async fn list_courses(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Course>>, AppError> {
    let me = require_user(&state, &headers)?;
    let abilities = AbilitySet::for_user(Some(&me));
    let sees_drafts = abilities.can(Action::Update, SubjectRef::kind(SubjectKind::Course), None);

    let courses = state
        .store
        .read(COURSES_COLLECTION)?
        .into_iter()
        .map(|doc| course_from_document(doc.id, doc.body))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter(|course| sees_drafts || course.published)
        .collect();
    Ok(Json(courses))
}

/// POST /api/courses - create a course (admin)
pub async fn create_course(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(mut course): Json<Course>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let me = require_user(&state, &headers)?;
    let abilities = AbilitySet::for_user(Some(&me));
    require_can(
        &abilities,
        Action::Create,
        SubjectRef::kind(SubjectKind::Course),
        None,
    )?;
    if course.title.trim().is_empty() {
        return Err(AppError::bad_request("Course title must not be empty"));
    }

    course.id = None;
    let id = state
        .store
        .write(COURSES_COLLECTION, &serde_json::to_value(&course)?)?;
    course.id = Some(id);
    info!(course = %course.title, created_by = %me.email, "Course created");
    Ok((StatusCode::CREATED, Json(course)))
}

/// PUT /api/courses/:id - update a course (admin)
pub async fn update_course(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(mut course): Json<Course>,
) -> Result<Json<Course>, AppError> {
    let me = require_user(&state, &headers)?;
    let abilities = AbilitySet::for_user(Some(&me));
    require_can(
        &abilities,
        Action::Update,
        SubjectRef::kind(SubjectKind::Course),
        None,
    )?;
    if course.title.trim().is_empty() {
        return Err(AppError::bad_request("Course title must not be empty"));
    }

    course.id = Some(id);
    state
        .store
        .update(COURSES_COLLECTION, id, &serde_json::to_value(&course)?)?;
    Ok(Json(course))
}

/// DELETE /api/courses/:id - remove a course (admin)
pub async fn delete_course(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let me = require_user(&state, &headers)?;
    let abilities = AbilitySet::for_user(Some(&me));
    require_can(
        &abilities,
        Action::Delete,
        SubjectRef::kind(SubjectKind::Course),
        None,
    )?;

    state.store.delete(COURSES_COLLECTION, id)?;
    Ok(StatusCode::NO_CONTENT)
}
