use aiden_core::api_routes::v1;
use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use crate::handlers::{
    auth, consents, employees, health, organisations, osint, scan,
};
use crate::infra::app_state::AppState;
use crate::middleware::auth::require_auth;

/// Create all v1 API routes
pub fn create_v1_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route(v1::HEALTH, get(health::health_handler))
        // Public scan endpoints
        .route(v1::scan::INITIATE, post(scan::initiate_scan_handler))
        .route(v1::scan::ITEM, get(scan::get_scan_handler))
        .route(v1::scan::EMAIL, post(scan::generate_scan_email_handler))
        .route(
            v1::scan::COLLECTOR_HEALTH,
            get(scan::collector_health_handler),
        )
        .route(
            v1::consents::COLLECTION,
            post(consents::record_consent_handler),
        )
        // Public onboarding
        .route(
            v1::organisations::COLLECTION,
            post(organisations::create_organisation_handler),
        )
        .route(
            v1::organisations::ADMIN,
            post(organisations::create_admin_handler),
        )
        .route(v1::auth::LOGIN, post(auth::login_handler))
        .merge(create_protected_routes(state))
}

/// Create protected routes that require authentication
fn create_protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(v1::auth::ME, get(auth::me_handler))
        .route(v1::auth::LOGOUT, post(auth::logout_handler))
        .route(
            v1::organisations::ITEM,
            get(organisations::get_organisation_handler)
                .put(organisations::update_organisation_handler),
        )
        .route(
            v1::organisations::SETTINGS,
            get(organisations::get_settings_handler)
                .put(organisations::put_settings_handler),
        )
        .route(
            v1::organisations::EMPLOYEES,
            get(organisations::list_employees_handler),
        )
        .route(
            v1::organisations::EMPLOYEES_BULK,
            post(organisations::bulk_employees_handler),
        )
        .route(
            v1::employees::ITEM,
            delete(employees::delete_employee_handler),
        )
        .route(v1::osint::GENERATE, post(osint::generate_osint_handler))
        .route(
            v1::osint::GENERATE_PHISHING,
            post(osint::generate_phishing_handler),
        )
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
