// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential exchange: login, renewal, and the single-flight coordinator
//! that serializes renewals.

pub mod auth;
pub mod refresh;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RefreshError;
use crate::session::Identity;

/// Lifetime assumed when the server omits `expiresIn` (30 minutes).
pub const DEFAULT_LIFETIME_SECS: u64 = 1800;

/// Performs the network exchange that trades an expiring credential for a
/// new one. The only component that talks to the renewal endpoint.
#[async_trait::async_trait]
pub trait RefreshGateway: Send + Sync {
    async fn refresh(&self) -> Result<RenewedCredential, RefreshError>;
}

/// A freshly issued access token.
#[derive(Clone, PartialEq, Eq)]
pub struct RenewedCredential {
    pub token: String,
    pub lifetime_secs: u64,
}

impl fmt::Debug for RenewedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenewedCredential")
            .field("token", &"<redacted>")
            .field("lifetime_secs", &self.lifetime_secs)
            .finish()
    }
}

/// Token portion of the login and renewal responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Lifetime in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

impl TokenResponse {
    pub fn lifetime_secs(&self) -> u64 {
        match self.expires_in {
            Some(secs) if secs > 0 => secs,
            _ => DEFAULT_LIFETIME_SECS,
        }
    }

    pub fn into_renewed(self) -> RenewedCredential {
        let lifetime_secs = self.lifetime_secs();
        RenewedCredential { token: self.access_token, lifetime_secs }
    }
}

/// Body of a successful login exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub token: TokenResponse,
    pub user: Identity,
}

/// Login credentials.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
