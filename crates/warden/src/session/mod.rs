// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session state: the authenticated identity, its bearer credential, and
//! the store that owns both.

pub mod clock;
pub mod persist;
pub mod store;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use store::{SessionChange, SessionObserver, SessionStore};

/// Authorization role of an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperUser,
    Chairperson,
    ViceChairperson,
    SecretaryGeneral,
    ViceSecretary,
    Treasurer,
    OrganizingSecretary,
    CommitteeMember,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperUser => "SUPER_USER",
            Self::Chairperson => "CHAIRPERSON",
            Self::ViceChairperson => "VICE_CHAIRPERSON",
            Self::SecretaryGeneral => "SECRETARY_GENERAL",
            Self::ViceSecretary => "VICE_SECRETARY",
            Self::Treasurer => "TREASURER",
            Self::OrganizingSecretary => "ORGANIZING_SECRETARY",
            Self::CommitteeMember => "COMMITTEE_MEMBER",
        }
    }

    /// Roles with unrestricted administrative access.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::SuperUser | Self::Chairperson)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: Role,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub must_change_password: bool,
}

fn default_true() -> bool {
    true
}

/// Token scheme. The API only issues bearer tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    #[default]
    #[serde(rename = "Bearer", alias = "bearer", alias = "BEARER")]
    Bearer,
}

/// Short-lived access credential.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub token: String,
    #[serde(rename = "tokenType", default)]
    pub kind: TokenKind,
    /// Expiry as epoch milliseconds.
    pub expires_at_ms: u64,
}

impl Credential {
    /// Build a bearer credential issued at `now_ms` that lives `lifetime_secs`.
    pub fn bearer(token: impl Into<String>, lifetime_secs: u64, now_ms: u64) -> Self {
        Self {
            token: token.into(),
            kind: TokenKind::Bearer,
            expires_at_ms: now_ms.saturating_add(lifetime_secs.saturating_mul(1000)),
        }
    }
}

// Never print the token itself.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("kind", &self.kind)
            .field("expires_at_ms", &self.expires_at_ms)
            .finish()
    }
}

/// A complete session. Identity and credential exist together or not at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub identity: Identity,
    pub credential: Credential,
}
