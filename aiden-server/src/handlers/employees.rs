use aiden_core::api_types::ApiResponse;
use aiden_model::EmployeeId;
use axum::{Extension, Json, extract::State};

use crate::infra::{app_state::AppState, errors::AppResult};
use crate::middleware::{auth::AuthUser, extract::ApiPath};

pub async fn delete_employee_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<EmployeeId>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.employees.delete(id, &auth.user).await?;
    Ok(Json(ApiResponse::success(()).with_message("Employee deleted.")))
}
