// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User activity monitor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::session::SessionStore;

/// Interaction signals that count as user activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivitySignal {
    PointerDown,
    PointerMove,
    KeyDown,
    Scroll,
    TouchStart,
    Click,
}

impl ActivitySignal {
    pub const ALL: [ActivitySignal; 6] = [
        Self::PointerDown,
        Self::PointerMove,
        Self::KeyDown,
        Self::Scroll,
        Self::TouchStart,
        Self::Click,
    ];
}

/// Coalesces interaction signals into store activity updates.
///
/// Only listens while attached; the supervisor attaches it for the lifetime
/// of an authenticated session.
pub struct ActivityMonitor {
    store: Arc<SessionStore>,
    throttle: Duration,
    attached: AtomicBool,
    last_recorded: Mutex<Option<Instant>>,
}

impl ActivityMonitor {
    pub fn new(store: Arc<SessionStore>, throttle: Duration) -> Self {
        Self { store, throttle, attached: AtomicBool::new(false), last_recorded: Mutex::new(None) }
    }

    /// Feed one interaction signal. Returns whether it was recorded.
    pub fn signal(&self, kind: ActivitySignal) -> bool {
        if !self.attached.load(Ordering::Acquire) {
            return false;
        }
        let now = Instant::now();
        {
            let mut last = self.last_recorded.lock();
            if last.is_some_and(|t| now.saturating_duration_since(t) < self.throttle) {
                return false;
            }
            *last = Some(now);
        }
        tracing::trace!(?kind, "activity");
        self.store.touch_activity();
        true
    }

    /// Start listening for signals.
    pub fn attach(&self) {
        if !self.attached.swap(true, Ordering::AcqRel) {
            tracing::debug!("activity monitor attached");
        }
    }

    /// Stop listening and forget the throttle window.
    pub fn detach(&self) {
        if self.attached.swap(false, Ordering::AcqRel) {
            *self.last_recorded.lock() = None;
            tracing::debug!("activity monitor detached");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    pub fn time_since_last_activity(&self) -> Duration {
        self.store.time_since_last_activity()
    }
}

impl std::fmt::Debug for ActivityMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityMonitor")
            .field("attached", &self.is_attached())
            .field("throttle", &self.throttle)
            .finish()
    }
}

#[cfg(test)]
#[path = "activity_tests.rs"]
mod tests;
