use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::Deserialize;

use vendex_core::api_types::ApiResponse;
use vendex_core::auth::{AuthenticatedUser, LoginResponse, RegistrationOutcome};
use vendex_core::users::{LoginRequest, RegisterRequest};

use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<Json<ApiResponse<RegistrationOutcome>>> {
    request
        .validate()
        .map_err(|e| AppError::bad_request(format!("Validation error: {e}")))?;

    let outcome = state.auth_service.register(request).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let response = state.auth_service.login(request).await?;
    Ok(Json(ApiResponse::success(response)))
}

#[derive(Debug, Deserialize)]
pub struct ConfirmQuery {
    pub token: String,
}

pub async fn confirm(
    State(state): State<AppState>,
    Query(query): Query<ConfirmQuery>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.auth_service.confirm_email(&query.token).await?;

    Ok(Json(ApiResponse::success(()).with_message(
        "Email confirmed. You can now log in.".to_string(),
    )))
}

pub async fn me(
    Extension(user): Extension<AuthenticatedUser>,
) -> Json<ApiResponse<AuthenticatedUser>> {
    Json(ApiResponse::success(user))
}
