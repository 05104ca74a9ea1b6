// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the login and renewal endpoints.

use std::sync::Arc;

use reqwest::StatusCode;

use crate::config::ClientConfig;
use crate::credential::{LoginRequest, LoginResponse, RefreshGateway, RenewedCredential, TokenResponse};
use crate::error::{error_message, RefreshError, SessionError};

/// Talks to `/auth/login` and `/auth/refresh`.
///
/// Owns the cookie-enabled HTTP client: the renewal endpoint authenticates
/// with the long-lived cookie set by the login response, never with the
/// expiring access token.
pub struct AuthClient {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
}

impl AuthClient {
    pub fn new(config: Arc<ClientConfig>) -> anyhow::Result<Self> {
        crate::ensure_crypto();
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { http, config })
    }

    /// The shared HTTP client (cookie jar included).
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Exchange email and password for an identity and credential.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, SessionError> {
        let resp = self
            .http
            .post(self.config.url(&self.config.login_path))
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = error_message(status.as_u16(), &text);
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(SessionError::LoginRejected(message));
            }
            return Err(SessionError::Request { status: status.as_u16(), message });
        }

        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait::async_trait]
impl RefreshGateway for AuthClient {
    async fn refresh(&self) -> Result<RenewedCredential, RefreshError> {
        let resp = self
            .http
            .post(self.config.url(&self.config.refresh_path))
            .send()
            .await
            .map_err(|e| RefreshError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = format!("{status}: {}", error_message(status.as_u16(), &text));
            if status.is_server_error() {
                return Err(RefreshError::Transport(message));
            }
            return Err(RefreshError::Rejected(message));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| RefreshError::Transport(format!("invalid renewal response: {e}")))?;
        Ok(token.into_renewed())
    }
}
