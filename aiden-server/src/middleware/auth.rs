use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use aiden_model::User;

use crate::infra::{app_state::AppState, errors::AppError};

/// Authenticated admin attached to the request by [`require_auth`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub token: String,
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(&request)
        .ok_or_else(|| AppError::unauthorized("Unauthenticated."))?;
    let user = state.accounts.authenticate(&token).await?;

    request.extensions_mut().insert(AuthUser { user, token });
    Ok(next.run(request).await)
}

fn extract_bearer_token(request: &Request) -> Option<String> {
    let value = request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with(value: &str) -> Request {
        Request::builder()
            .header(header::AUTHORIZATION, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn bearer_prefix_is_required() {
        assert_eq!(
            extract_bearer_token(&request_with("Bearer abc")).as_deref(),
            Some("abc")
        );
        assert!(extract_bearer_token(&request_with("Basic abc")).is_none());
        assert!(extract_bearer_token(&request_with("Bearer   ")).is_none());
    }
}
