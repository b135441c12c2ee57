//! Endpoint handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use crate::blockchain::ProofSubmission;
use crate::http::request::request_id;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::mail::DeliveryResult;
use crate::pipeline::{EmailRequest, SendEmailBody};

#[derive(Debug, Serialize)]
pub struct InteractResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub ledger: bool,
}

/// `POST /api/send-email`
pub async fn send_email(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<SendEmailBody>, JsonRejection>,
) -> Result<Json<DeliveryResult>, ApiError> {
    let request_id = request_id(&headers);
    let Json(body) = body.inspect_err(|e| {
        tracing::warn!(request_id, error = %e, "Rejected send-email body");
    })?;

    let request = EmailRequest::from_body(body, &state.default_qr_url).inspect_err(|e| {
        tracing::warn!(request_id, error = %e, "Invalid send-email request");
    })?;

    tracing::info!(
        request_id,
        recipient = %request.recipient,
        target_url = %request.target_url,
        "Sending QR email"
    );

    let result = state.pipeline.send_qr_email(request).await?;
    Ok(Json(result))
}

/// `POST /contract/interact`
pub async fn contract_interact(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ProofSubmission>, JsonRejection>,
) -> Result<Json<InteractResponse>, ApiError> {
    let request_id = request_id(&headers);
    let Some(ledger) = state.ledger.as_ref() else {
        return Err(ApiError::Unavailable(
            "Contract interaction is not configured".to_string(),
        ));
    };

    let Json(submission) = body.inspect_err(|e| {
        tracing::warn!(request_id, error = %e, "Rejected contract body");
    })?;

    tracing::info!(
        request_id,
        proof_len = submission.input_proof.len(),
        "Submitting input proof"
    );

    let record = ledger.submit_proof(submission).await.inspect_err(|e| {
        tracing::error!(request_id, error = %e, "Contract interaction failed");
    })?;

    tracing::info!(
        request_id,
        tx_hash = %record.transaction_hash,
        status = ?record.status,
        "Contract interaction confirmed"
    );

    Ok(Json(InteractResponse { success: true }))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        ledger: state.ledger.is_some(),
    })
}
