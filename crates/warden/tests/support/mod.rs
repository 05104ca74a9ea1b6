// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process mock of the dashboard API for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use warden::session::persist::{MemoryStorage, Storage};
use warden::{ClientConfig, SessionClient, SessionEvent};

pub const EMAIL: &str = "alice@example.org";
pub const PASSWORD: &str = "correct-horse";
pub const RESET_TOKEN: &str = "reset-ok";
const REFRESH_COOKIE: &str = "refresh=r1";

/// How the renewal endpoint answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Issue a fresh, valid token.
    Renew,
    /// 401: the refresh cookie is no longer honored.
    Reject,
    /// 200 with a token the API will not accept.
    Stale,
    /// 503.
    Unavailable,
}

pub struct ApiState {
    valid_token: Mutex<String>,
    issued: AtomicU32,
    refresh_mode: Mutex<RefreshMode>,
    refresh_delay: Mutex<Duration>,
    pub login_calls: AtomicU32,
    pub refresh_calls: AtomicU32,
    pub refresh_with_cookie: AtomicU32,
    pub refresh_with_bearer: AtomicU32,
    pub member_calls: AtomicU32,
    pub reset_requests: AtomicU32,
}

impl Default for ApiState {
    fn default() -> Self {
        Self {
            valid_token: Mutex::new(String::new()),
            issued: AtomicU32::new(0),
            refresh_mode: Mutex::new(RefreshMode::Renew),
            refresh_delay: Mutex::new(Duration::ZERO),
            login_calls: AtomicU32::new(0),
            refresh_calls: AtomicU32::new(0),
            refresh_with_cookie: AtomicU32::new(0),
            refresh_with_bearer: AtomicU32::new(0),
            member_calls: AtomicU32::new(0),
            reset_requests: AtomicU32::new(0),
        }
    }
}

impl ApiState {
    fn issue(&self) -> String {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let token = format!("tok-{n}");
        *self.valid_token.lock() = token.clone();
        token
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        match bearer {
            Some(token) => !token.is_empty() && *self.valid_token.lock() == token,
            None => false,
        }
    }
}

pub struct MockApi {
    pub addr: SocketAddr,
    pub state: Arc<ApiState>,
}

impl MockApi {
    pub async fn start() -> anyhow::Result<Self> {
        let state = Arc::new(ApiState::default());
        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/refresh", post(refresh))
            .route("/api/auth/change-password", post(change_password))
            .route("/api/auth/request-password-reset", post(request_reset))
            .route("/api/auth/reset-password", post(reset_password))
            .route("/api/members", get(members))
            .route("/api/members/slow", get(slow_members))
            .route("/api/reports", get(reports))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        Ok(Self { addr, state })
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig { api_url: format!("http://{}/api", self.addr), ..ClientConfig::default() }
    }

    pub fn client(&self) -> anyhow::Result<SessionClient> {
        self.client_with(self.config(), Arc::new(MemoryStorage::new()))
    }

    pub fn client_with(
        &self,
        config: ClientConfig,
        storage: Arc<dyn Storage>,
    ) -> anyhow::Result<SessionClient> {
        SessionClient::new(config, storage)
    }

    /// A client that has already signed in.
    pub async fn signed_in(&self) -> anyhow::Result<Arc<SessionClient>> {
        let client = Arc::new(self.client()?);
        client.login(EMAIL, PASSWORD).await?;
        Ok(client)
    }

    /// Make the API reject every access token issued so far.
    pub fn revoke_access(&self) {
        self.state.valid_token.lock().clear();
    }

    pub fn set_refresh_mode(&self, mode: RefreshMode) {
        *self.state.refresh_mode.lock() = mode;
    }

    /// Hold each renewal this long before answering.
    pub fn set_refresh_delay(&self, delay: Duration) {
        *self.state.refresh_delay.lock() = delay;
    }

    pub fn refresh_calls(&self) -> u32 {
        self.state.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn member_calls(&self) -> u32 {
        self.state.member_calls.load(Ordering::SeqCst)
    }
}

fn api_error(status: StatusCode, message: &str) -> Response {
    let body = json!({
        "timestamp": "2026-01-01T00:00:00Z",
        "status": status.as_u16(),
        "error": status.canonical_reason(),
        "message": message,
    });
    (status, Json(body)).into_response()
}

async fn login(State(api): State<Arc<ApiState>>, Json(body): Json<Value>) -> Response {
    api.login_calls.fetch_add(1, Ordering::SeqCst);
    if body["password"] != PASSWORD {
        return api_error(StatusCode::UNAUTHORIZED, "Invalid email or password");
    }
    let email = body["email"].as_str().unwrap_or_default().to_owned();
    let body = json!({
        "accessToken": api.issue(),
        "tokenType": "Bearer",
        "expiresIn": 900,
        "user": {
            "id": "u-1",
            "name": "Alice Wanjiru",
            "email": email,
            "role": "TREASURER",
            "isActive": true,
            "mustChangePassword": false,
        },
    });
    ([(header::SET_COOKIE, format!("{REFRESH_COOKIE}; Path=/; HttpOnly"))], Json(body))
        .into_response()
}

async fn refresh(State(api): State<Arc<ApiState>>, headers: HeaderMap) -> Response {
    api.refresh_calls.fetch_add(1, Ordering::SeqCst);
    let cookie = headers.get(header::COOKIE).and_then(|v| v.to_str().ok()).unwrap_or_default();
    if cookie.contains(REFRESH_COOKIE) {
        api.refresh_with_cookie.fetch_add(1, Ordering::SeqCst);
    }
    if headers.contains_key(header::AUTHORIZATION) {
        api.refresh_with_bearer.fetch_add(1, Ordering::SeqCst);
    }

    let delay = *api.refresh_delay.lock();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let mode = *api.refresh_mode.lock();
    match mode {
        RefreshMode::Renew => {
            Json(json!({ "accessToken": api.issue(), "tokenType": "Bearer", "expiresIn": 900 }))
                .into_response()
        }
        RefreshMode::Reject => api_error(StatusCode::UNAUTHORIZED, "Refresh token expired"),
        RefreshMode::Stale => {
            Json(json!({ "accessToken": "tok-stale", "expiresIn": 900 })).into_response()
        }
        RefreshMode::Unavailable => {
            api_error(StatusCode::SERVICE_UNAVAILABLE, "Service temporarily unavailable")
        }
    }
}

async fn members(State(api): State<Arc<ApiState>>, headers: HeaderMap) -> Response {
    api.member_calls.fetch_add(1, Ordering::SeqCst);
    if !api.authorized(&headers) {
        return api_error(StatusCode::UNAUTHORIZED, "Full authentication is required");
    }
    Json(json!([{ "id": "m-1", "name": "Otieno" }, { "id": "m-2", "name": "Achieng" }]))
        .into_response()
}

/// Checks the token only after a pause, so a renewal can land meanwhile.
async fn slow_members(State(api): State<Arc<ApiState>>, headers: HeaderMap) -> Response {
    tokio::time::sleep(Duration::from_millis(300)).await;
    members(State(api), headers).await
}

async fn reports(State(api): State<Arc<ApiState>>, headers: HeaderMap) -> Response {
    if !api.authorized(&headers) {
        return api_error(StatusCode::UNAUTHORIZED, "Full authentication is required");
    }
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "Database unavailable")
}

async fn change_password(
    State(api): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !api.authorized(&headers) {
        return api_error(StatusCode::UNAUTHORIZED, "Full authentication is required");
    }
    if body["currentPassword"] != PASSWORD {
        return api_error(StatusCode::BAD_REQUEST, "Current password is incorrect");
    }
    StatusCode::OK.into_response()
}

async fn request_reset(State(api): State<Arc<ApiState>>, Json(body): Json<Value>) -> Response {
    if body["email"].as_str().is_none() {
        return api_error(StatusCode::BAD_REQUEST, "Email is required");
    }
    api.reset_requests.fetch_add(1, Ordering::SeqCst);
    StatusCode::OK.into_response()
}

async fn reset_password(Json(body): Json<Value>) -> Response {
    if body["token"] != RESET_TOKEN || body["newPassword"].as_str().is_none() {
        return api_error(StatusCode::BAD_REQUEST, "Invalid or expired reset token");
    }
    StatusCode::OK.into_response()
}

/// Count `Terminated` events among `events`.
pub fn terminations(events: &[SessionEvent]) -> usize {
    events.iter().filter(|e| matches!(e, SessionEvent::Terminated { .. })).count()
}

/// Drain every event currently queued on a receiver.
pub fn drain(rx: &mut tokio::sync::broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}
