use axum::{extract::State, http::StatusCode, Extension, Json};

use crate::{
    error::AppError,
    models::user::{AuthResponse, Claims, LoginRequest, RegisterRequest, UserView},
    validate, AppState,
};

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let input = validate::register(payload)?;
    let response = state.auth.register(input).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let attempt = validate::login(payload)?;
    let user = state
        .auth
        .validate_credentials(&attempt.email, &attempt.password)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    Ok(Json(state.auth.login(user)?))
}

pub async fn profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserView>, AppError> {
    let user_id = claims.sub.parse::<i64>().map_err(|_| AppError::InvalidToken)?;
    Ok(Json(state.auth.profile(user_id).await?))
}
