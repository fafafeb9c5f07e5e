//! Budget suggestion endpoint
//!
//! Strictly best-effort: `suggestions` is null whenever the advisor
//! declines (thin history, no backend, unusable model output). The
//! response is always a 200; there is nothing here for a client to
//! retry.

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, Json};
use serde::Serialize;

use fisc_core::budget::BudgetAdvisor;
use fisc_core::models::{BudgetSuggestion, Expense};

use crate::{require_user, AppError, AppState};

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: Option<Vec<BudgetSuggestion>>,
}

/// GET /api/budget/suggestions - model-proposed category caps
pub async fn budget_suggestions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<SuggestionsResponse>, AppError> {
    let me = require_user(&state, &headers)?;

    let Some(ref client) = state.ai else {
        return Ok(Json(SuggestionsResponse { suggestions: None }));
    };

    let expenses: Vec<Expense> = state
        .store
        .read("expenses")?
        .into_iter()
        .filter_map(|doc| serde_json::from_value(doc.body).ok())
        .filter(|e: &Expense| e.owner_id == me.id)
        .collect();

    let advisor = BudgetAdvisor::new(client.clone());
    let suggestions = advisor.suggest(&expenses).await;
    Ok(Json(SuggestionsResponse { suggestions }))
}
