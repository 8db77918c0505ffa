use aiden_core::api_types::{ApiResponse, LoginRequest, LoginResponse, UserSummary};
use axum::{Extension, Json, extract::State};

use crate::infra::{app_state::AppState, errors::AppResult};
use crate::middleware::{auth::AuthUser, extract::ApiJson};

pub async fn login_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let session = state
        .accounts
        .login(&request.email, &request.password)
        .await?;
    Ok(Json(
        ApiResponse::success(LoginResponse {
            token: session.token,
            user: session.user.into(),
        })
        .with_message("Logged in"),
    ))
}

pub async fn me_handler(
    Extension(auth): Extension<AuthUser>,
) -> Json<ApiResponse<UserSummary>> {
    Json(ApiResponse::success(auth.user.into()))
}

pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.accounts.logout(&auth.token).await?;
    Ok(Json(ApiResponse::success(()).with_message("Logged out")))
}
