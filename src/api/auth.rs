//! Registration, login and session endpoints.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use tracing::info;

use super::{AppState, AuthUser};
use crate::error::ApiResult;
use crate::types::{TokenResponse, UserLogin, UserRegister, UserResponse};

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<UserRegister>,
) -> ApiResult<(StatusCode, Json<TokenResponse>)> {
    let response = state.auth.register(&body.email, &body.password).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<UserLogin>,
) -> ApiResult<Json<TokenResponse>> {
    let response = state.auth.authenticate(&body.email, &body.password).await?;
    info!(user_id = response.user.id, "User logged in");
    Ok(Json(response))
}

pub async fn me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}

#[derive(Serialize)]
pub struct LogoutResponse {
    message: &'static str,
    detail: &'static str,
}

/// Tokens are stateless; the client discards its copy.
pub async fn logout(AuthUser(user): AuthUser) -> Json<LogoutResponse> {
    info!(user_id = user.id, "User logged out");
    Json(LogoutResponse {
        message: "Logged out successfully",
        detail: "Token has been invalidated on frontend",
    })
}
