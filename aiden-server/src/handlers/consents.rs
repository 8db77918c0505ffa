use aiden_core::api_types::{ApiResponse, ConsentRecordedResponse};
use aiden_core::services::ConsentSubmission;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::infra::{app_state::AppState, errors::AppResult};
use crate::middleware::extract::{ApiJson, ClientContext};

pub async fn record_consent_handler(
    State(state): State<AppState>,
    client: ClientContext,
    ApiJson(submission): ApiJson<ConsentSubmission>,
) -> AppResult<impl IntoResponse> {
    let consent = state
        .consents
        .record(&submission, client.ip, client.user_agent)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(
            ApiResponse::success(ConsentRecordedResponse {
                consent_id: consent.id,
            })
            .with_message("Consent recorded"),
        ),
    ))
}
