//! Session and role gateway.
//!
//! Wraps the external identity provider behind an explicitly owned session
//! context: state is published through a watch channel instead of living in
//! an ambient global, and every consumer receives the gateway by reference.

pub mod guards;
pub mod provider;

#[cfg(test)]
pub mod testing;

pub use provider::{AuthSession, AuthUser, IdentityProvider};

use std::sync::Arc;

use tokio::sync::watch;

use crate::db::RoleStore;
use crate::errors::AppError;
use crate::models::UserRole;

/// Session lifecycle: `Loading` holds until the first session-change event
/// from the provider resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    Anonymous,
    Authenticated { user: AuthUser, role: UserRole },
}

/// Gateway over the identity provider and the role store.
pub struct SessionGateway {
    provider: Arc<dyn IdentityProvider>,
    roles: Arc<RoleStore>,
    state: watch::Sender<SessionState>,
}

impl SessionGateway {
    pub fn new(provider: Arc<dyn IdentityProvider>, roles: Arc<RoleStore>) -> Self {
        let (state, _) = watch::channel(SessionState::Loading);
        Self {
            provider,
            roles,
            state,
        }
    }

    /// Snapshot of the current session state.
    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Subscribe to session state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Drive the session state machine from the provider's change stream.
    ///
    /// Each event with a user resolves that user's role document (creating
    /// the non-admin default on first login) before entering `Authenticated`.
    /// Runs until the provider side of the stream is dropped.
    pub async fn run(self: Arc<Self>) {
        let mut changes = self.provider.subscribe_session_changes();
        loop {
            let change = changes.borrow_and_update().clone();
            self.apply_session_change(change).await;
            if changes.changed().await.is_err() {
                break;
            }
        }
    }

    async fn apply_session_change(&self, change: Option<AuthUser>) {
        let next = match change {
            Some(user) => {
                let role = match self.roles.fetch_or_create(&user.uid).await {
                    Ok(role) => role,
                    Err(e) => {
                        // Degrade to the non-admin default rather than
                        // blocking the session
                        tracing::error!("Failed to fetch role for {}: {}", user.uid, e);
                        UserRole::default()
                    }
                };
                SessionState::Authenticated { user, role }
            }
            None => SessionState::Anonymous,
        };
        self.state.send_replace(next);
    }

    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AppError> {
        Ok(self
            .provider
            .sign_in_with_password(email, password)
            .await?)
    }

    pub async fn register_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AppError> {
        Ok(self
            .provider
            .register_with_password(email, password)
            .await?)
    }

    pub async fn sign_in_with_google(&self, idp_token: &str) -> Result<AuthSession, AppError> {
        Ok(self.provider.sign_in_federated(idp_token).await?)
    }

    /// Grant admin privileges to an account.
    ///
    /// When the target is the current session's own user, the cached role is
    /// updated immediately; the next authoritative stream event overwrites it
    /// without merging.
    pub async fn promote_to_admin(&self, account_id: &str) -> Result<(), AppError> {
        self.roles.set_admin(account_id, true).await?;

        let current = self.current();
        if let SessionState::Authenticated { user, .. } = current {
            if user.uid == account_id {
                self.state.send_replace(SessionState::Authenticated {
                    user,
                    role: UserRole { is_admin: true },
                });
            }
        }

        Ok(())
    }

    /// Fresh round-trip admin check for the current session, bypassing the
    /// cached role.
    pub async fn check_admin(&self) -> Result<bool, AppError> {
        match self.current() {
            SessionState::Authenticated { user, .. } => {
                let role = self.roles.get_role(&user.uid).await?;
                Ok(role.map(|r| r.is_admin).unwrap_or(false))
            }
            _ => Ok(false),
        }
    }

    /// Sign out and clear the cached role.
    pub async fn sign_out(&self) {
        self.provider.sign_out().await;
        self.state.send_replace(SessionState::Anonymous);
    }
}
