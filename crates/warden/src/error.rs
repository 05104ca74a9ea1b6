// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

/// Failure of the credential renewal exchange.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    /// The server declined to renew. Terminal for the session.
    #[error("refresh rejected: {0}")]
    Rejected(String),
    /// Network or server unavailability. May succeed on a later attempt.
    #[error("refresh transport error: {0}")]
    Transport(String),
    /// The session was cleared while the renewal was outstanding.
    #[error("no session to refresh")]
    NoSession,
}

impl RefreshError {
    /// Whether the failure definitively invalidates the session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected(_) | Self::NoSession)
    }
}

/// Errors surfaced to callers of the session client.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The session ended while the call was in progress.
    #[error("session expired")]
    SessionExpired,
    /// The call requires a session and there is none.
    #[error("not authenticated")]
    NotAuthenticated,
    /// The login exchange was refused.
    #[error("login rejected: {0}")]
    LoginRejected(String),
    /// A non-authorization failure returned by the API.
    #[error("request failed ({status}): {message}")]
    Request { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl SessionError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::LoginRejected(_) => "LOGIN_REJECTED",
            Self::Request { .. } => "REQUEST_FAILED",
            Self::Transport(_) => "TRANSPORT",
            Self::Decode(_) => "DECODE",
            Self::InvalidInput(_) => "INVALID_INPUT",
        }
    }

    /// HTTP status of an API failure, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Error envelope returned by the API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Best human-readable message for a failed response body.
pub fn error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody { message: Some(m), .. }) if !m.is_empty() => m,
        Ok(ApiErrorBody { error: Some(e), .. }) if !e.is_empty() => e,
        _ if !body.trim().is_empty() => body.trim().to_owned(),
        _ => format!("HTTP {status}"),
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
