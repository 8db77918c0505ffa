use aiden_core::api_types::{ApiResponse, EmployeeTarget};
use aiden_core::services::OsintSnapshot;
use aiden_model::PhishingEmail;
use axum::{Extension, Json, extract::State};

use crate::infra::{app_state::AppState, errors::AppResult};
use crate::middleware::{auth::AuthUser, extract::ApiJson};

/// Employee OSINT, served from cache inside the freshness window.
pub async fn generate_osint_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(target): ApiJson<EmployeeTarget>,
) -> AppResult<Json<ApiResponse<OsintSnapshot>>> {
    let snapshot = state
        .employees
        .refresh_osint(target.employee_id, &auth.user)
        .await?;
    let message = if snapshot.cached {
        "OSINT already up to date"
    } else {
        "OSINT generated"
    };
    Ok(Json(ApiResponse::success(snapshot).with_message(message)))
}

pub async fn generate_phishing_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(target): ApiJson<EmployeeTarget>,
) -> AppResult<Json<ApiResponse<PhishingEmail>>> {
    let email = state
        .employees
        .generate_phishing(target.employee_id, &auth.user)
        .await?;
    Ok(Json(
        ApiResponse::success(email).with_message("Phishing email generated"),
    ))
}
