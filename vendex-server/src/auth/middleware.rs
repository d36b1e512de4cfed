use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::infra::{app_state::AppState, errors::AppError};

/// Authorize the bearer token and stash the resolved user in request
/// extensions for downstream handlers.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(&request)?;
    let user = state.auth_service.authorize_bearer(&token).await?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn extract_bearer_token(request: &Request) -> Result<String, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            AppError::unauthorized("Missing authorization header")
        })?;

    if !auth_header.starts_with("Bearer ") {
        return Err(AppError::unauthorized("Invalid authorization header"));
    }

    Ok(auth_header[7..].to_string())
}
