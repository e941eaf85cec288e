//! Route guard policies.
//!
//! Pure decision functions over session state, plus the HTTP middleware that
//! applies the admin policy to guarded routes.

use std::sync::Arc;

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{IdentityProvider, SessionState};
use crate::db::RoleStore;
use crate::errors::AppError;

/// Outcome of evaluating a guard against the current session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Render,
    /// Still resolving the first session check; show a pending indicator
    /// instead of redirecting.
    Pending,
    RedirectToLogin,
    /// Authenticated but not an admin; show the denial with the account email.
    AccessDenied { email: Option<String> },
}

/// Authenticated-only policy.
pub fn protected_route(state: &SessionState) -> RouteDecision {
    match state {
        SessionState::Loading => RouteDecision::Pending,
        SessionState::Anonymous => RouteDecision::RedirectToLogin,
        SessionState::Authenticated { .. } => RouteDecision::Render,
    }
}

/// Admin-only policy.
///
/// `recheck` is the result of the secondary server round-trip: `Some(true)`
/// confirms admin, `Some(false)` denies, `None` means the round-trip failed.
/// Access is granted when either the re-check or the cached role says admin;
/// a failed re-check therefore falls back to the cached role alone.
pub fn admin_route(state: &SessionState, recheck: Option<bool>) -> RouteDecision {
    match state {
        SessionState::Loading => RouteDecision::Pending,
        SessionState::Anonymous => RouteDecision::RedirectToLogin,
        SessionState::Authenticated { user, role } => {
            if recheck == Some(true) || role.is_admin {
                RouteDecision::Render
            } else {
                RouteDecision::AccessDenied {
                    email: user.email.clone(),
                }
            }
        }
    }
}

/// Extract the bearer token from a request's Authorization header.
pub fn bearer_token(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}

/// Admin guard middleware for the HTTP surface.
///
/// Verifies the bearer token with the provider, loads the role with a fresh
/// store round-trip, and maps the guard decision onto 401/403 responses.
pub async fn admin_auth_layer(
    provider: Arc<dyn IdentityProvider>,
    roles: Arc<RoleStore>,
    request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()) else {
        return AppError::Unauthorized("Missing bearer token".to_string()).into_response();
    };

    let user = match provider.verify_token(&token).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return AppError::Unauthorized("Invalid or expired session".to_string())
                .into_response();
        }
        Err(e) => return AppError::from(e).into_response(),
    };

    // Fresh role lookup; a store failure denies rather than granting on a
    // possibly stale assumption
    let recheck = match roles.fetch_or_create(&user.uid).await {
        Ok(role) => Some(role.is_admin),
        Err(e) => {
            tracing::error!("Admin re-check failed for {}: {}", user.uid, e);
            None
        }
    };

    let state = SessionState::Authenticated {
        user: user.clone(),
        role: recheck.map(|is_admin| crate::models::UserRole { is_admin }).unwrap_or_default(),
    };

    match admin_route(&state, recheck) {
        RouteDecision::Render => next.run(request).await,
        RouteDecision::AccessDenied { email } => AppError::AccessDenied {
            message: "You do not have admin privileges".to_string(),
            email,
        }
        .into_response(),
        _ => AppError::Unauthorized("Not signed in".to_string()).into_response(),
    }
}
