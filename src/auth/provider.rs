//! Identity provider client.
//!
//! The provider is an external collaborator reached over HTTP; this module
//! holds the trait the rest of the application programs against, the REST
//! implementation, and the mapping from provider error codes to the
//! classified taxonomy shown to users.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::errors::{AppError, AuthErrorKind};

/// An authenticated account as reported by the provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub uid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A signed-in session: the account plus its bearer token.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: AuthUser,
    pub id_token: String,
}

/// Raw provider failure, before classification.
#[derive(Debug)]
pub enum AuthProviderError {
    /// Provider-reported error code (e.g. EMAIL_NOT_FOUND)
    Code(String),
    /// Transport failure reaching the provider
    Transport(String),
}

/// Map a provider error code to its classified kind.
pub fn classify_provider_code(code: &str) -> AuthErrorKind {
    match code {
        "INVALID_EMAIL" => AuthErrorKind::InvalidEmail,
        "EMAIL_NOT_FOUND" => AuthErrorKind::AccountNotFound,
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => AuthErrorKind::WrongCredential,
        "TOO_MANY_ATTEMPTS_TRY_LATER" => AuthErrorKind::RateLimited,
        _ => AuthErrorKind::Other,
    }
}

impl From<AuthProviderError> for AppError {
    fn from(err: AuthProviderError) -> Self {
        match err {
            AuthProviderError::Code(code) => {
                tracing::warn!("Identity provider rejected request: {}", code);
                AppError::Auth(classify_provider_code(&code))
            }
            AuthProviderError::Transport(msg) => {
                tracing::error!("Identity provider unreachable: {}", msg);
                AppError::Upstream(format!("Identity provider unreachable: {}", msg))
            }
        }
    }
}

/// External identity provider contract.
///
/// Success state transitions are observed through the session-change stream,
/// not through the return values of the sign-in calls.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthProviderError>;

    async fn register_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthProviderError>;

    /// Exchange an IdP credential (obtained by the front-end popup flow) for
    /// a provider session.
    async fn sign_in_federated(&self, idp_token: &str) -> Result<AuthSession, AuthProviderError>;

    /// Resolve a bearer token to its account. An invalid or expired token is
    /// `None`, not an error.
    async fn verify_token(&self, token: &str) -> Result<Option<AuthUser>, AuthProviderError>;

    async fn sign_out(&self);

    /// Subscribe to session changes. The receiver holds the current session
    /// and observes every subsequent sign-in and sign-out.
    fn subscribe_session_changes(&self) -> watch::Receiver<Option<AuthUser>>;
}

// ==================== REST IMPLEMENTATION ====================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetails,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetails {
    message: String,
}

/// REST client for the identity provider.
///
/// No retries and no timeouts beyond the HTTP client's defaults; a hung
/// provider call hangs the dependent flow.
pub struct RestIdentityProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    sessions: watch::Sender<Option<AuthUser>>,
}

impl RestIdentityProvider {
    pub fn new(base_url: String, api_key: String) -> Self {
        let (sessions, _) = watch::channel(None);
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            sessions,
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/accounts:{}?key={}", self.base_url, action, self.api_key)
    }

    async fn post_for_session(
        &self,
        action: &str,
        body: serde_json::Value,
    ) -> Result<AuthSession, AuthProviderError> {
        let response = self
            .client
            .post(self.endpoint(action))
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthProviderError::Transport(e.to_string()))?;

        if response.status().is_success() {
            let body: SignInResponse = response
                .json()
                .await
                .map_err(|e| AuthProviderError::Transport(e.to_string()))?;
            let session = AuthSession {
                user: AuthUser {
                    uid: body.local_id,
                    email: body.email,
                },
                id_token: body.id_token,
            };
            self.sessions.send_replace(Some(session.user.clone()));
            Ok(session)
        } else {
            Err(provider_error(response).await)
        }
    }
}

async fn provider_error(response: reqwest::Response) -> AuthProviderError {
    let status = response.status();
    match response.json::<ApiErrorBody>().await {
        Ok(body) => AuthProviderError::Code(body.error.message),
        Err(_) => AuthProviderError::Transport(format!("provider returned {}", status)),
    }
}

#[async_trait]
impl IdentityProvider for RestIdentityProvider {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthProviderError> {
        self.post_for_session(
            "signInWithPassword",
            serde_json::json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }),
        )
        .await
    }

    async fn register_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthProviderError> {
        self.post_for_session(
            "signUp",
            serde_json::json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }),
        )
        .await
    }

    async fn sign_in_federated(&self, idp_token: &str) -> Result<AuthSession, AuthProviderError> {
        self.post_for_session(
            "signInWithIdp",
            serde_json::json!({
                "postBody": format!("id_token={}&providerId=google.com", idp_token),
                "requestUri": "http://localhost",
                "returnSecureToken": true,
            }),
        )
        .await
    }

    async fn verify_token(&self, token: &str) -> Result<Option<AuthUser>, AuthProviderError> {
        let response = self
            .client
            .post(self.endpoint("lookup"))
            .json(&serde_json::json!({ "idToken": token }))
            .send()
            .await
            .map_err(|e| AuthProviderError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            // Rejected tokens are an anonymous session, not a failure
            return Ok(None);
        }

        let body: LookupResponse = response
            .json()
            .await
            .map_err(|e| AuthProviderError::Transport(e.to_string()))?;

        Ok(body.users.into_iter().next().map(|u| AuthUser {
            uid: u.local_id,
            email: u.email,
        }))
    }

    async fn sign_out(&self) {
        self.sessions.send_replace(None);
    }

    fn subscribe_session_changes(&self) -> watch::Receiver<Option<AuthUser>> {
        self.sessions.subscribe()
    }
}
