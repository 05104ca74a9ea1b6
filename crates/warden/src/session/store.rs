// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The session store: single owner of identity, credential, and activity
//! bookkeeping.
//!
//! Every mutation is a short synchronous critical section; nothing here
//! awaits. Side effects (persistence) are pushed to registered
//! [`SessionObserver`]s so the transitions themselves stay testable without
//! a storage backend.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;

use crate::session::clock::EpochClock;
use crate::session::persist::PersistedSession;
use crate::session::{AuthSession, Credential, Identity};

/// A committed change to the store.
#[derive(Debug)]
pub enum SessionChange<'a> {
    /// A session was created or updated.
    Stored { session: &'a AuthSession, last_activity_ms: u64 },
    /// The session was removed.
    Cleared,
}

/// Hook invoked after every committed change.
///
/// Observers run under the store lock and must not call back into the store.
pub trait SessionObserver: Send + Sync {
    fn session_changed(&self, change: &SessionChange<'_>);
}

struct Inner {
    session: Option<AuthSession>,
    last_activity_ms: u64,
    /// Bumped whenever the session is replaced or removed.
    generation: u64,
}

pub struct SessionStore {
    inner: Mutex<Inner>,
    clock: EpochClock,
    expiry_margin: Duration,
    observers: RwLock<Vec<Arc<dyn SessionObserver>>>,
    activity_tx: watch::Sender<u64>,
}

impl SessionStore {
    /// Create an empty store. Credentials expiring within `expiry_margin`
    /// are reported as already expired.
    pub fn new(expiry_margin: Duration) -> Self {
        let clock = EpochClock::new();
        let now = clock.now_ms();
        let (activity_tx, _) = watch::channel(now);
        Self {
            inner: Mutex::new(Inner { session: None, last_activity_ms: now, generation: 0 }),
            clock,
            expiry_margin,
            observers: RwLock::new(Vec::new()),
            activity_tx,
        }
    }

    /// Register an observer for subsequent changes.
    pub fn observe(&self, observer: Arc<dyn SessionObserver>) {
        self.observers.write().push(observer);
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Replace identity and credential atomically and reset activity.
    pub fn set_session(&self, identity: Identity, credential: Credential) {
        let now = self.clock.now_ms();
        let mut inner = self.inner.lock();
        inner.session = Some(AuthSession { identity, credential });
        inner.last_activity_ms = now;
        inner.generation += 1;
        self.notify_stored(&inner);
        drop(inner);
        self.activity_tx.send_replace(now);
    }

    /// Drop the session. Returns whether one was present.
    pub fn clear_session(&self) -> bool {
        let mut inner = self.inner.lock();
        self.clear_locked(&mut inner)
    }

    /// Drop the session only if it is still generation `generation`.
    pub fn clear_session_if(&self, generation: u64) -> bool {
        let mut inner = self.inner.lock();
        if inner.generation != generation {
            return false;
        }
        self.clear_locked(&mut inner)
    }

    /// Rehydrate from durable storage without writing back.
    pub fn restore(&self, persisted: PersistedSession) {
        let mut inner = self.inner.lock();
        let now = self.clock.now_ms();
        inner.last_activity_ms = persisted.last_activity_at_ms.map_or(now, |ms| ms.min(now));
        inner.session =
            Some(AuthSession { identity: persisted.identity, credential: persisted.credential });
        inner.generation += 1;
    }

    /// Identifies the current session; changes on login, logout and restore.
    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.lock().session.is_some()
    }

    /// True when no credential exists or it expires within the safety margin.
    pub fn is_credential_expired(&self) -> bool {
        let now = self.clock.now_ms();
        let margin = self.expiry_margin.as_millis() as u64;
        match self.inner.lock().session.as_ref() {
            Some(s) => now.saturating_add(margin) >= s.credential.expires_at_ms,
            None => true,
        }
    }

    /// Time left before the credential expires, ignoring the safety margin.
    pub fn credential_expires_in(&self) -> Option<Duration> {
        let now = self.clock.now_ms();
        let inner = self.inner.lock();
        let expires_at = inner.session.as_ref()?.credential.expires_at_ms;
        Some(Duration::from_millis(expires_at.saturating_sub(now)))
    }

    /// Swap in a renewed token, leaving identity and activity untouched.
    ///
    /// Returns false (and changes nothing) when there is no session.
    pub fn update_credential(&self, token: impl Into<String>, lifetime_secs: u64) -> bool {
        let now = self.clock.now_ms();
        let mut inner = self.inner.lock();
        self.replace_credential(&mut inner, Credential::bearer(token, lifetime_secs, now))
    }

    /// Like [`update_credential`](Self::update_credential), but only for
    /// session generation `generation`.
    pub fn update_credential_if(
        &self,
        generation: u64,
        token: impl Into<String>,
        lifetime_secs: u64,
    ) -> bool {
        let now = self.clock.now_ms();
        let mut inner = self.inner.lock();
        if inner.generation != generation {
            return false;
        }
        self.replace_credential(&mut inner, Credential::bearer(token, lifetime_secs, now))
    }

    /// Replace the identity wholesale after a profile update.
    pub fn update_identity(&self, identity: Identity) -> bool {
        let mut inner = self.inner.lock();
        let Some(session) = inner.session.as_mut() else {
            return false;
        };
        session.identity = identity;
        self.notify_stored(&inner);
        true
    }

    pub fn touch_activity(&self) {
        let now = self.clock.now_ms();
        self.inner.lock().last_activity_ms = now;
        self.activity_tx.send_replace(now);
    }

    pub fn time_since_last_activity(&self) -> Duration {
        let now = self.clock.now_ms();
        let last = self.inner.lock().last_activity_ms;
        Duration::from_millis(now.saturating_sub(last))
    }

    /// Watch the last-activity instant (epoch ms).
    pub fn subscribe_activity(&self) -> watch::Receiver<u64> {
        self.activity_tx.subscribe()
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.inner.lock().session.as_ref().map(|s| s.identity.clone())
    }

    /// Token to attach to outgoing requests.
    pub fn access_token(&self) -> Option<String> {
        self.inner.lock().session.as_ref().map(|s| s.credential.token.clone())
    }

    pub fn snapshot(&self) -> Option<PersistedSession> {
        let inner = self.inner.lock();
        inner.session.as_ref().map(|s| PersistedSession::new(s, inner.last_activity_ms))
    }

    fn replace_credential(&self, inner: &mut Inner, credential: Credential) -> bool {
        let Some(session) = inner.session.as_mut() else {
            return false;
        };
        session.credential = credential;
        self.notify_stored(inner);
        true
    }

    fn clear_locked(&self, inner: &mut Inner) -> bool {
        let was_present = inner.session.take().is_some();
        if was_present {
            inner.generation += 1;
        }
        self.notify(&SessionChange::Cleared);
        was_present
    }

    fn notify_stored(&self, inner: &Inner) {
        if let Some(session) = inner.session.as_ref() {
            self.notify(&SessionChange::Stored {
                session,
                last_activity_ms: inner.last_activity_ms,
            });
        }
    }

    fn notify(&self, change: &SessionChange<'_>) {
        for observer in self.observers.read().iter() {
            observer.session_changed(change);
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .field("expiry_margin", &self.expiry_margin)
            .finish()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
