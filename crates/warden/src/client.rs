// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session client: one handle wiring the store, renewal, dispatch and
//! supervision together.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::config::ClientConfig;
use crate::credential::auth::AuthClient;
use crate::credential::refresh::RefreshCoordinator;
use crate::credential::{LoginRequest, RefreshGateway};
use crate::error::SessionError;
use crate::events::{SessionEvent, SessionEvents};
use crate::guard::{RouteDecision, RouteGuard};
use crate::session::persist::{self, FileStorage, Storage, StorageObserver};
use crate::session::{Credential, Identity, SessionStore};
use crate::supervisor::{ActivityMonitor, SessionSupervisor, SupervisorTiming};
use crate::transport::Dispatcher;

/// Shortest password accepted by the change and reset flows.
pub const MIN_PASSWORD_LEN: usize = 8;

const CHANGE_PASSWORD_PATH: &str = "/auth/change-password";
const REQUEST_RESET_PATH: &str = "/auth/request-password-reset";
const RESET_PASSWORD_PATH: &str = "/auth/reset-password";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetPasswordRequest<'a> {
    token: &'a str,
    new_password: &'a str,
}

#[derive(Serialize)]
struct PasswordResetRequest<'a> {
    email: &'a str,
}

pub struct SessionClient {
    config: Arc<ClientConfig>,
    store: Arc<SessionStore>,
    events: SessionEvents,
    auth: Arc<AuthClient>,
    coordinator: Arc<RefreshCoordinator>,
    dispatcher: Dispatcher,
    monitor: Arc<ActivityMonitor>,
    supervisor: Arc<SessionSupervisor>,
}

impl SessionClient {
    /// Build a client backed by `storage`, restoring any persisted session.
    pub fn new(config: ClientConfig, storage: Arc<dyn Storage>) -> anyhow::Result<Self> {
        let config = Arc::new(config);
        let store = Arc::new(SessionStore::new(config.expiry_margin()));
        if let Some(persisted) = persist::load_session(storage.as_ref()) {
            tracing::info!(user = %persisted.identity.id, "restored persisted session");
            store.restore(persisted);
        }
        store.observe(Arc::new(StorageObserver::new(storage)));

        let events = SessionEvents::new();
        let auth = Arc::new(AuthClient::new(Arc::clone(&config))?);
        let gateway: Arc<dyn RefreshGateway> = auth.clone();
        let coordinator = RefreshCoordinator::new(gateway, Arc::clone(&store), events.clone());
        let dispatcher = Dispatcher::new(
            auth.http().clone(),
            Arc::clone(&config),
            Arc::clone(&store),
            Arc::clone(&coordinator),
            events.clone(),
        );
        let monitor = Arc::new(ActivityMonitor::new(Arc::clone(&store), config.activity_throttle()));
        let supervisor = SessionSupervisor::new(
            SupervisorTiming::from_config(&config),
            Arc::clone(&store),
            Arc::clone(&monitor),
            Arc::clone(&coordinator),
            events.clone(),
        );

        Ok(Self { config, store, events, auth, coordinator, dispatcher, monitor, supervisor })
    }

    /// Build a client persisting to the configured (or default) state dir.
    pub fn open(config: ClientConfig) -> anyhow::Result<Self> {
        let dir = config.state_dir.clone().unwrap_or_else(persist::state_dir);
        Self::new(config, Arc::new(FileStorage::new(dir)))
    }

    /// Start supervising. Must run inside a tokio runtime.
    pub fn start(&self) {
        self.supervisor.start();
    }

    /// Stop supervising; the session stays stored.
    pub fn shutdown(&self) {
        self.supervisor.stop();
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, SessionError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(SessionError::InvalidInput("email and password are required".to_owned()));
        }
        let request = LoginRequest { email: email.to_owned(), password: password.to_owned() };
        let response = self.auth.login(&request).await?;

        let lifetime_secs = response.token.lifetime_secs();
        let credential =
            Credential::bearer(response.token.access_token, lifetime_secs, self.store.now_ms());
        let identity = response.user;
        self.store.set_session(identity.clone(), credential);
        tracing::info!(user = %identity.id, role = %identity.role, lifetime_secs, "logged in");
        self.events.emit(SessionEvent::Authenticated { user_id: identity.id.clone() });
        Ok(identity)
    }

    /// End the session. Returns whether one was present.
    pub fn logout(&self) -> bool {
        self.supervisor.logout()
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.store.current_identity()
    }

    /// Replace the stored identity after a profile update.
    pub fn update_identity(&self, identity: Identity) -> bool {
        self.store.update_identity(identity)
    }

    /// Change the password, then end the session so the user signs in again.
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), SessionError> {
        check_password(new_password)?;
        if !self.store.is_authenticated() {
            return Err(SessionError::NotAuthenticated);
        }
        let body = ChangePasswordRequest { current_password, new_password };
        self.dispatcher.post_empty(CHANGE_PASSWORD_PATH, &body).await?;
        tracing::info!("password changed");
        self.supervisor.logout();
        Ok(())
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<(), SessionError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(SessionError::InvalidInput("email is required".to_owned()));
        }
        self.dispatcher.post_empty(REQUEST_RESET_PATH, &PasswordResetRequest { email }).await
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), SessionError> {
        check_password(new_password)?;
        if token.is_empty() {
            return Err(SessionError::InvalidInput("reset token is required".to_owned()));
        }
        self.dispatcher
            .post_empty(RESET_PASSWORD_PATH, &ResetPasswordRequest { token, new_password })
            .await
    }

    /// Route decision for the current identity.
    pub fn route(&self, path: &str) -> RouteDecision {
        RouteGuard::decide(path, self.store.current_identity().as_ref())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn activity(&self) -> &Arc<ActivityMonitor> {
        &self.monitor
    }

    pub fn supervisor(&self) -> &Arc<SessionSupervisor> {
        &self.supervisor
    }

    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

fn check_password(password: &str) -> Result<(), SessionError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(SessionError::InvalidInput(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

impl Drop for SessionClient {
    fn drop(&mut self) {
        self.supervisor.stop();
    }
}

impl fmt::Debug for SessionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionClient")
            .field("api_url", &self.config.api_url)
            .field("authenticated", &self.is_authenticated())
            .field("supervisor", &self.supervisor)
            .finish()
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
