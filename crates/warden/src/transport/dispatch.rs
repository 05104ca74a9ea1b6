// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request dispatcher: every API call goes through here.
//!
//! Attaches the current bearer token and, on a 401 from a non-auth
//! endpoint, renews through the shared [`RefreshCoordinator`] and retries
//! the call exactly once.

use std::sync::Arc;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::credential::refresh::RefreshCoordinator;
use crate::error::{error_message, SessionError};
use crate::events::{RefreshOrigin, SessionEvents, TerminationReason};
use crate::session::SessionStore;
use crate::transport::{ApiRequest, ApiResponse};

struct Inner {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
    store: Arc<SessionStore>,
    coordinator: Arc<RefreshCoordinator>,
    events: SessionEvents,
}

/// HTTP client core. Cheap to clone.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl Dispatcher {
    pub fn new(
        http: reqwest::Client,
        config: Arc<ClientConfig>,
        store: Arc<SessionStore>,
        coordinator: Arc<RefreshCoordinator>,
        events: SessionEvents,
    ) -> Self {
        Self { inner: Arc::new(Inner { http, config, store, coordinator, events }) }
    }

    /// Send a request, renewing the credential once if it is rejected.
    ///
    /// Non-2xx responses other than a handled 401 come back untouched as
    /// [`SessionError::Request`].
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, SessionError> {
        let inner = &self.inner;
        let sent_token = inner.store.access_token();
        let resp = self.execute(&request, sent_token.as_deref()).await?;

        if resp.status != StatusCode::UNAUTHORIZED || inner.config.is_auth_exempt(&request.path) {
            return finish(resp);
        }
        let Some(sent_token) = sent_token else {
            return Err(SessionError::NotAuthenticated);
        };

        let retry_token = match inner.store.access_token() {
            None => return Err(SessionError::NotAuthenticated),
            // Renewed by someone else while this call was out.
            Some(current) if current != sent_token => current,
            Some(_) => match inner.coordinator.refresh(RefreshOrigin::Reactive).await {
                Ok(token) => token,
                Err(e) => {
                    tracing::debug!(path = %request.path, err = %e, "request abandoned, refresh failed");
                    return Err(SessionError::SessionExpired);
                }
            },
        };

        let retry = self.execute(&request, Some(&retry_token)).await?;
        if retry.status == StatusCode::UNAUTHORIZED {
            tracing::warn!(path = %request.path, "request unauthorized after refresh");
            inner.events.terminate(&inner.store, TerminationReason::Expired);
            return Err(SessionError::SessionExpired);
        }
        finish(retry)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, SessionError> {
        self.send(ApiRequest::get(path)).await?.json()
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, SessionError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::post(path).json(body)?).await?.json()
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, SessionError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::new(reqwest::Method::PUT, path).json(body)?).await?.json()
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, SessionError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::new(reqwest::Method::PATCH, path).json(body)?).await?.json()
    }

    pub async fn delete(&self, path: &str) -> Result<(), SessionError> {
        self.send(ApiRequest::new(reqwest::Method::DELETE, path)).await?;
        Ok(())
    }

    /// POST a body and discard the response.
    pub async fn post_empty<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), SessionError> {
        self.send(ApiRequest::post(path).json(body)?).await?;
        Ok(())
    }

    async fn execute(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> Result<ApiResponse, SessionError> {
        let inner = &self.inner;
        let mut req = inner.http.request(request.method.clone(), inner.config.url(&request.path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(ref body) = request.body {
            req = req.json(body);
        }
        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        tracing::debug!(method = %request.method, path = %request.path, %status, "api call");
        Ok(ApiResponse { status, body })
    }
}

fn finish(resp: ApiResponse) -> Result<ApiResponse, SessionError> {
    if resp.status.is_success() {
        return Ok(resp);
    }
    let status = resp.status.as_u16();
    Err(SessionError::Request { status, message: error_message(status, &resp.body) })
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").field("api_url", &self.inner.config.api_url).finish()
    }
}
