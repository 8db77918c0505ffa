use aiden_core::api_types::{
    ApiResponse, BulkEmployeesRequest, BulkEmployeesResponse,
    OrganisationResponse, UserSummary,
};
use aiden_core::services::{
    AdminRegistration, EmployeeInput, OrganisationInput, SettingsInput,
};
use aiden_model::{Employee, OrganisationId, OrganisationSettings};
use axum::{
    Extension, Json, extract::State, http::StatusCode, response::IntoResponse,
};

use crate::infra::{app_state::AppState, errors::AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::extract::{ApiJson, ApiPath};

pub async fn create_organisation_handler(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<OrganisationInput>,
) -> AppResult<impl IntoResponse> {
    let organisation = state.organisations.create(&input).await?;
    Ok((
        StatusCode::CREATED,
        Json(
            ApiResponse::success(OrganisationResponse { organisation })
                .with_message("Organisation created successfully"),
        ),
    ))
}

pub async fn get_organisation_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<OrganisationId>,
) -> AppResult<Json<ApiResponse<OrganisationResponse>>> {
    let organisation = state.organisations.get(id, &auth.user).await?;
    Ok(Json(ApiResponse::success(OrganisationResponse { organisation })))
}

pub async fn update_organisation_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<OrganisationId>,
    ApiJson(input): ApiJson<OrganisationInput>,
) -> AppResult<Json<ApiResponse<OrganisationResponse>>> {
    let organisation =
        state.organisations.update(id, &auth.user, &input).await?;
    Ok(Json(
        ApiResponse::success(OrganisationResponse { organisation })
            .with_message("Organisation updated."),
    ))
}

/// First admin of an organisation. Public; refuses once an admin exists.
pub async fn create_admin_handler(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OrganisationId>,
    ApiJson(registration): ApiJson<AdminRegistration>,
) -> AppResult<impl IntoResponse> {
    let user = state.accounts.create_admin(id, &registration).await?;
    Ok((
        StatusCode::CREATED,
        Json(
            ApiResponse::success(UserSummary::from(user))
                .with_message("Organisation admin created successfully."),
        ),
    ))
}

pub async fn get_settings_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<OrganisationId>,
) -> AppResult<Json<ApiResponse<Option<OrganisationSettings>>>> {
    let settings = state.organisations.get_settings(id, &auth.user).await?;
    Ok(Json(ApiResponse::success(settings)))
}

pub async fn put_settings_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<OrganisationId>,
    ApiJson(input): ApiJson<SettingsInput>,
) -> AppResult<Json<ApiResponse<OrganisationSettings>>> {
    let settings = state
        .organisations
        .upsert_settings(id, &auth.user, &input)
        .await?;
    Ok(Json(ApiResponse::success(settings).with_message("Settings saved.")))
}

pub async fn list_employees_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<OrganisationId>,
) -> AppResult<Json<ApiResponse<Vec<Employee>>>> {
    let employees = state.employees.list(id, &auth.user).await?;
    Ok(Json(ApiResponse::success(employees)))
}

pub async fn bulk_employees_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<OrganisationId>,
    ApiJson(request): ApiJson<BulkEmployeesRequest<EmployeeInput>>,
) -> AppResult<impl IntoResponse> {
    let count = state
        .employees
        .bulk_upload(id, &auth.user, request.employees)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(
            ApiResponse::success(BulkEmployeesResponse { count })
                .with_message("Employees added successfully."),
        ),
    ))
}
