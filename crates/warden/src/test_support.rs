// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: fixtures and a scriptable renewal gateway.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Semaphore;

use crate::credential::{RefreshGateway, RenewedCredential};
use crate::error::RefreshError;
use crate::session::{Credential, Identity, Role, SessionStore};

/// Identity with a pending password change, named after `name`.
pub fn identity(name: &str) -> Identity {
    Identity {
        id: format!("id-{name}"),
        name: name.to_owned(),
        email: format!("{name}@example.org"),
        phone: None,
        role: Role::Treasurer,
        is_active: true,
        must_change_password: true,
    }
}

/// Store holding a session for "alice" whose token lives `lifetime_secs`.
pub fn logged_in_store(lifetime_secs: u64) -> Arc<SessionStore> {
    let store = Arc::new(SessionStore::new(Duration::from_secs(5)));
    let credential = Credential::bearer("tok-1", lifetime_secs, store.now_ms());
    store.set_session(identity("alice"), credential);
    store
}

/// Scriptable [`RefreshGateway`] that counts calls and can be held open.
pub struct MockGateway {
    calls: AtomicU32,
    result: Mutex<Result<RenewedCredential, RefreshError>>,
    gate: Option<Semaphore>,
}

impl MockGateway {
    /// Always renews to `token`.
    pub fn ok(token: &str, lifetime_secs: u64) -> Self {
        Self {
            calls: AtomicU32::new(0),
            result: Mutex::new(Ok(RenewedCredential { token: token.to_owned(), lifetime_secs })),
            gate: None,
        }
    }

    /// Always fails with `err`.
    pub fn failing(err: RefreshError) -> Self {
        Self { calls: AtomicU32::new(0), result: Mutex::new(Err(err)), gate: None }
    }

    /// Block every call until [`release`](Self::release).
    pub fn held(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(Semaphore::MAX_PERMITS / 2);
        }
    }

    pub fn set_result(&self, result: Result<RenewedCredential, RefreshError>) {
        *self.result.lock() = result;
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RefreshGateway for MockGateway {
    async fn refresh(&self) -> Result<RenewedCredential, RefreshError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await;
        }
        self.result.lock().clone()
    }
}

/// Drain every event currently queued on a receiver.
pub fn drain_events(
    rx: &mut tokio::sync::broadcast::Receiver<crate::events::SessionEvent>,
) -> Vec<crate::events::SessionEvent> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}

/// Yield until `cond` holds, giving spawned tasks a chance to run.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    assert!(cond(), "condition not reached");
}
