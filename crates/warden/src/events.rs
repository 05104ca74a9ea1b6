// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session lifecycle events and the broadcast hub that fans them out.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::session::SessionStore;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    Idle,
    Expired,
    Manual,
}

impl TerminationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Expired => "expired",
            Self::Manual => "manual",
        }
    }

    /// User-facing notice for the landing page.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Idle => "Your session has expired due to inactivity",
            Self::Expired => "Your session has expired, please log in again",
            Self::Manual => "You have been logged out",
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which path asked for a credential renewal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshOrigin {
    /// A request failed with 401.
    Reactive,
    /// The supervisor's refresh timer.
    Proactive,
}

impl fmt::Display for RefreshOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Reactive => "reactive",
            Self::Proactive => "proactive",
        })
    }
}

/// Events emitted over the session lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A login exchange stored a new session.
    Authenticated { user_id: String },
    /// The credential was renewed.
    Refreshed { origin: RefreshOrigin, expires_in_secs: u64 },
    /// A renewal attempt failed.
    #[serde(rename = "refresh:failed")]
    RefreshFailed { origin: RefreshOrigin, error: String, transient: bool },
    /// The idle logout is `remaining_secs` away.
    IdleWarning { remaining_secs: u64 },
    /// The session ended and the store is cleared.
    Terminated { reason: TerminationReason },
}

/// Broadcast hub for [`SessionEvent`]s.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.tx.send(event);
    }

    /// Clear the store and announce the termination.
    ///
    /// Emits exactly one `Terminated` event per live session; returns false
    /// (and emits nothing) if the session was already gone.
    pub fn terminate(&self, store: &SessionStore, reason: TerminationReason) -> bool {
        let cleared = store.clear_session();
        self.announce(cleared, reason)
    }

    /// Like [`terminate`](Self::terminate), but only ends session
    /// generation `generation`; a later session is left alone.
    pub fn terminate_if(
        &self,
        store: &SessionStore,
        generation: u64,
        reason: TerminationReason,
    ) -> bool {
        let cleared = store.clear_session_if(generation);
        self.announce(cleared, reason)
    }

    fn announce(&self, cleared: bool, reason: TerminationReason) -> bool {
        if cleared {
            tracing::info!(%reason, "session terminated");
            self.emit(SessionEvent::Terminated { reason });
        }
        cleared
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}
