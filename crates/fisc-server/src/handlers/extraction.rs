//! AI-assisted data entry endpoints
//!
//! Documents arrive base64-encoded in the request body and are handed
//! to the extraction pipeline. Validation failures map to 422 via the
//! core error taxonomy; a missing model backend is a 503 so clients
//! can distinguish "not configured" from "you sent garbage".

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use tracing::info;

use fisc_core::ai::AIClient;
use fisc_core::extract::Extractor;
use fisc_core::models::{PayslipData, StatementTransaction};

use crate::{require_user, AppError, AppState, MAX_DOCUMENT_SIZE};

/// Upload body for the extraction endpoints
#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    /// Base64-encoded PDF document
    pub document_base64: String,
}

#[derive(Debug, Serialize)]
pub struct StatementResponse {
    pub transactions: Vec<StatementTransaction>,
}

fn require_backend(state: &AppState) -> Result<&AIClient, AppError> {
    state.ai.as_ref().ok_or_else(|| {
        AppError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "Document extraction is not available on this server",
        )
    })
}

fn decode_document(request: &ExtractRequest) -> Result<Vec<u8>, AppError> {
    let bytes = BASE64
        .decode(request.document_base64.as_bytes())
        .map_err(|_| AppError::bad_request("document_base64 is not valid base64"))?;
    if bytes.len() > MAX_DOCUMENT_SIZE {
        return Err(AppError::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            "Document exceeds the maximum accepted size",
        ));
    }
    Ok(bytes)
}

/// POST /api/extract/payslip - structured data from a payslip PDF
pub async fn extract_payslip(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<PayslipData>, AppError> {
    let me = require_user(&state, &headers)?;
    let client = require_backend(&state)?;
    let document = decode_document(&request)?;

    let extractor = Extractor::new(client.clone());
    let data = extractor.extract_payslip(&document).await?;
    info!(user = %me.email, net_pay = data.net_pay, "Payslip extracted");
    Ok(Json(data))
}

/// POST /api/extract/statement - transactions from a bank statement PDF
pub async fn extract_statement(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<StatementResponse>, AppError> {
    let me = require_user(&state, &headers)?;
    let client = require_backend(&state)?;
    let document = decode_document(&request)?;

    let extractor = Extractor::new(client.clone());
    let transactions = extractor.extract_statement(&document).await?;
    info!(user = %me.email, count = transactions.len(), "Statement extracted");
    Ok(Json(StatementResponse { transactions }))
}
