//! Authentication API endpoints.
//!
//! Thin delegation to the session gateway; credential verification itself
//! happens at the external identity provider.

use axum::{extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};

use super::{success, ApiResult};
use crate::auth::{guards, AuthSession, AuthUser};
use crate::errors::AppError;
use crate::models::{PromoteRequest, UserRole};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleSignInRequest {
    pub idp_token: String,
}

/// A signed-in session as returned to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: AuthUser,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

async fn session_response(
    state: &AppState,
    session: AuthSession,
) -> Result<SessionResponse, AppError> {
    let role = state.roles.fetch_or_create(&session.user.uid).await?;
    Ok(SessionResponse {
        user: session.user,
        role,
        id_token: Some(session.id_token),
    })
}

/// POST /api/auth/login - Sign in with email and password.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> ApiResult<SessionResponse> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(AppError::Validation(
            "Please enter both email and password".to_string(),
        ));
    }

    let session = state
        .gateway
        .sign_in_with_password(&request.email, &request.password)
        .await?;
    success(session_response(&state, session).await?)
}

/// POST /api/auth/register - Create an account with email and password.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> ApiResult<SessionResponse> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(AppError::Validation(
            "Please enter both email and password".to_string(),
        ));
    }

    let session = state
        .gateway
        .register_with_password(&request.email, &request.password)
        .await?;
    success(session_response(&state, session).await?)
}

/// POST /api/auth/google - Exchange a federated IdP credential for a session.
pub async fn google_sign_in(
    State(state): State<AppState>,
    Json(request): Json<GoogleSignInRequest>,
) -> ApiResult<SessionResponse> {
    let session = state.gateway.sign_in_with_google(&request.idp_token).await?;
    success(session_response(&state, session).await?)
}

/// GET /api/auth/session - Resolve the caller's bearer token to its session.
pub async fn current_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<SessionResponse> {
    let token = guards::bearer_token(&headers)
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;

    let user = state
        .provider
        .verify_token(&token)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired session".to_string()))?;

    let role = state.roles.fetch_or_create(&user.uid).await?;
    success(SessionResponse {
        user,
        role,
        id_token: None,
    })
}

/// POST /api/auth/logout - Sign out the in-process session.
pub async fn logout(State(state): State<AppState>) -> ApiResult<()> {
    state.gateway.sign_out().await;
    success(())
}

/// POST /api/auth/promote - Grant admin privileges to an account.
pub async fn promote_account(
    State(state): State<AppState>,
    Json(request): Json<PromoteRequest>,
) -> ApiResult<()> {
    if request.account_id.trim().is_empty() {
        return Err(AppError::Validation("Account id is required".to_string()));
    }

    state.gateway.promote_to_admin(&request.account_id).await?;
    success(())
}
