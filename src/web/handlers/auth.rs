//! Account handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use crate::web::dto::{ApiResponse, AuthResponse, CredentialsRequest, UpdateAccountRequest};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

async fn auth_response(state: &AppState, username: &str) -> Result<AuthResponse, ApiError> {
    let stamp = state
        .accounts
        .credentials()
        .stamp(username)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    Ok(AuthResponse {
        access_token: state.generate_access_token(username, stamp)?,
        expires_in: state.access_token_expiry,
        username: username.to_string(),
    })
}

/// POST /api/auth/signup - Register a new user.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ApiError> {
    state.accounts.signup(&req.username, &req.password).await?;

    let response = auth_response(&state, &req.username).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(response))))
}

/// POST /api/auth/login - User login.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("Username and password are required"));
    }

    if let Err(e) = state.accounts.login(&req.username, &req.password).await {
        tracing::info!(username = %req.username, "Login failed");
        return Err(e.into());
    }

    tracing::info!(username = %req.username, "Logged in");
    Ok(Json(ApiResponse::new(
        auth_response(&state, &req.username).await?,
    )))
}

/// PUT /api/account - Change the caller's username and password.
///
/// Returns a token for the new username; tokens for the old one stop working.
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    state
        .accounts
        .update_account(&user.username, &req.new_username, &req.new_password)
        .await?;

    Ok(Json(ApiResponse::new(
        auth_response(&state, &req.new_username).await?,
    )))
}
