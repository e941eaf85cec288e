//! In-memory identity provider for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::watch;

use super::provider::{AuthProviderError, AuthSession, AuthUser, IdentityProvider};

struct Account {
    password: String,
    uid: String,
}

/// Mock provider with preset accounts and federated credentials. Issues
/// tokens of the form `token-{uid}` and reports errors with the same codes
/// the real provider uses.
pub struct MockIdentityProvider {
    accounts: Mutex<HashMap<String, Account>>,
    tokens: Mutex<HashMap<String, AuthUser>>,
    google_tokens: Mutex<HashMap<String, AuthUser>>,
    sessions: watch::Sender<Option<AuthUser>>,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        let (sessions, _) = watch::channel(None);
        Self {
            accounts: Mutex::new(HashMap::new()),
            tokens: Mutex::new(HashMap::new()),
            google_tokens: Mutex::new(HashMap::new()),
            sessions,
        }
    }

    pub fn with_account(self, email: &str, password: &str, uid: &str) -> Self {
        self.accounts.lock().unwrap().insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                uid: uid.to_string(),
            },
        );
        self
    }

    pub fn with_google_token(self, idp_token: &str, uid: &str, email: &str) -> Self {
        self.google_tokens.lock().unwrap().insert(
            idp_token.to_string(),
            AuthUser {
                uid: uid.to_string(),
                email: Some(email.to_string()),
            },
        );
        self
    }

    /// The bearer token the mock would issue for an account.
    pub fn token_for(uid: &str) -> String {
        format!("token-{}", uid)
    }

    fn issue_session(&self, user: AuthUser) -> AuthSession {
        let token = Self::token_for(&user.uid);
        self.tokens
            .lock()
            .unwrap()
            .insert(token.clone(), user.clone());
        self.sessions.send_replace(Some(user.clone()));
        AuthSession {
            user,
            id_token: token,
        }
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthProviderError> {
        if !email.contains('@') {
            return Err(AuthProviderError::Code("INVALID_EMAIL".to_string()));
        }

        let user = {
            let accounts = self.accounts.lock().unwrap();
            let Some(account) = accounts.get(email) else {
                return Err(AuthProviderError::Code("EMAIL_NOT_FOUND".to_string()));
            };
            if account.password != password {
                return Err(AuthProviderError::Code("INVALID_PASSWORD".to_string()));
            }
            AuthUser {
                uid: account.uid.clone(),
                email: Some(email.to_string()),
            }
        };

        Ok(self.issue_session(user))
    }

    async fn register_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthProviderError> {
        if !email.contains('@') {
            return Err(AuthProviderError::Code("INVALID_EMAIL".to_string()));
        }

        let user = {
            let mut accounts = self.accounts.lock().unwrap();
            if accounts.contains_key(email) {
                return Err(AuthProviderError::Code("EMAIL_EXISTS".to_string()));
            }
            let uid = format!("user-{}", accounts.len() + 1);
            accounts.insert(
                email.to_string(),
                Account {
                    password: password.to_string(),
                    uid: uid.clone(),
                },
            );
            AuthUser {
                uid,
                email: Some(email.to_string()),
            }
        };

        Ok(self.issue_session(user))
    }

    async fn sign_in_federated(&self, idp_token: &str) -> Result<AuthSession, AuthProviderError> {
        let user = {
            let tokens = self.google_tokens.lock().unwrap();
            match tokens.get(idp_token) {
                Some(user) => user.clone(),
                None => return Err(AuthProviderError::Code("INVALID_IDP_RESPONSE".to_string())),
            }
        };

        Ok(self.issue_session(user))
    }

    async fn verify_token(&self, token: &str) -> Result<Option<AuthUser>, AuthProviderError> {
        Ok(self.tokens.lock().unwrap().get(token).cloned())
    }

    async fn sign_out(&self) {
        self.sessions.send_replace(None);
    }

    fn subscribe_session_changes(&self) -> watch::Receiver<Option<AuthUser>> {
        self.sessions.subscribe()
    }
}
