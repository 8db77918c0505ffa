use aiden_core::api_types::{
    ApiResponse, CollectorHealthResponse, InitiateScanRequest,
    InitiateScanResponse, ScanResultsQuery,
};
use aiden_core::orchestration::ScanResults;
use aiden_model::{ScanEmail, ScanId};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::infra::{app_state::AppState, errors::AppResult};
use crate::middleware::extract::{ApiJson, ApiPath, ApiQuery};

/// Queue a scan. Only persistence and queueing happen on the request path.
pub async fn initiate_scan_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<InitiateScanRequest>,
) -> AppResult<impl IntoResponse> {
    let scan_id = state
        .orchestrator
        .initiate(&request.email, request.consent)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(
            ApiResponse::success(InitiateScanResponse { scan_id })
                .with_message("Scan queued"),
        ),
    ))
}

pub async fn get_scan_handler(
    State(state): State<AppState>,
    ApiPath(scan_id): ApiPath<ScanId>,
    ApiQuery(query): ApiQuery<ScanResultsQuery>,
) -> AppResult<Json<ApiResponse<ScanResults>>> {
    let results = state.orchestrator.get_results(scan_id, query.limit).await?;
    Ok(Json(ApiResponse::success(results)))
}

pub async fn generate_scan_email_handler(
    State(state): State<AppState>,
    ApiPath(scan_id): ApiPath<ScanId>,
) -> AppResult<Json<ApiResponse<ScanEmail>>> {
    let email = state.orchestrator.generate_email(scan_id).await?;
    Ok(Json(ApiResponse::success(email)))
}

pub async fn collector_health_handler(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CollectorHealthResponse>>> {
    let reachable = state.orchestrator.collector_health().await?;
    Ok(Json(ApiResponse::success(CollectorHealthResponse { reachable })))
}
