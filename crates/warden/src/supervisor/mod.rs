// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session supervisor: idle timeout, proactive renewal and expiry checks
//! for one authenticated session at a time.
//!
//! Transitions come from [`machine::transition`]; this module only owns the
//! timers and runs the requested effects.

pub mod activity;
pub mod machine;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::credential::refresh::RefreshCoordinator;
use crate::events::{RefreshOrigin, SessionEvent, SessionEvents, TerminationReason};
use crate::session::SessionStore;

pub use activity::{ActivityMonitor, ActivitySignal};
pub use machine::{Effect, SupervisorInput, SupervisorState};

/// Timer settings for the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorTiming {
    pub idle_timeout: Duration,
    pub idle_warning_after: Duration,
    pub refresh_interval: Duration,
    pub expiry_check_interval: Duration,
    /// Consecutive transient renewal failures tolerated before giving up.
    pub max_refresh_failures: u32,
}

impl SupervisorTiming {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            idle_timeout: config.idle_timeout(),
            idle_warning_after: config.idle_warning_after(),
            refresh_interval: config.refresh_interval(),
            expiry_check_interval: config.expiry_check_interval(),
            max_refresh_failures: config.max_refresh_failures.max(1),
        }
    }
}

impl Default for SupervisorTiming {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

pub struct SessionSupervisor {
    timing: SupervisorTiming,
    store: Arc<SessionStore>,
    monitor: Arc<ActivityMonitor>,
    coordinator: Arc<RefreshCoordinator>,
    events: SessionEvents,
    state_tx: watch::Sender<SupervisorState>,
    shutdown: Mutex<Option<CancellationToken>>,
}

impl SessionSupervisor {
    pub fn new(
        timing: SupervisorTiming,
        store: Arc<SessionStore>,
        monitor: Arc<ActivityMonitor>,
        coordinator: Arc<RefreshCoordinator>,
        events: SessionEvents,
    ) -> Arc<Self> {
        let (state_tx, _) = watch::channel(SupervisorState::Unauthenticated);
        Arc::new(Self {
            timing,
            store,
            monitor,
            coordinator,
            events,
            state_tx,
            shutdown: Mutex::new(None),
        })
    }

    /// Spawn the supervision task. No-op if already running.
    pub fn start(self: &Arc<Self>) {
        let mut slot = self.shutdown.lock();
        if slot.is_some() {
            return;
        }
        let shutdown = CancellationToken::new();
        *slot = Some(shutdown.clone());
        drop(slot);

        // Subscribe before spawning so a login right after start is not missed.
        let events = self.events.subscribe();
        let this = Arc::clone(self);
        tokio::spawn(async move { this.run(events, shutdown).await });
    }

    /// Stop all timers. The stored session is left alone.
    pub fn stop(&self) {
        if let Some(shutdown) = self.shutdown.lock().take() {
            shutdown.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.shutdown.lock().is_some()
    }

    pub fn state(&self) -> SupervisorState {
        *self.state_tx.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<SupervisorState> {
        self.state_tx.subscribe()
    }

    /// Explicit logout. Returns whether a session was cleared.
    pub fn logout(&self) -> bool {
        // Clear first so a session the supervisor never picked up still ends.
        let cleared = self.events.terminate(&self.store, TerminationReason::Manual);
        let effects = self.apply(SupervisorInput::Logout);
        self.run_effects(&effects);
        cleared
    }

    /// Mark a termination as handled by the UI.
    pub fn acknowledge(&self) {
        self.apply(SupervisorInput::Acknowledge);
    }

    async fn run(
        self: Arc<Self>,
        mut events: broadcast::Receiver<SessionEvent>,
        shutdown: CancellationToken,
    ) {
        loop {
            if !self.store.is_authenticated() {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    event = events.recv() => match event {
                        Ok(SessionEvent::Authenticated { .. }) => {}
                        Ok(_) | Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => break,
                    },
                }
                if !self.store.is_authenticated() {
                    continue;
                }
            }

            let effects = self.apply(SupervisorInput::Authenticated);
            self.run_effects(&effects);
            if !self.supervise(&mut events, &shutdown).await {
                break;
            }
        }
        self.monitor.detach();
        tracing::debug!("session supervisor stopped");
    }

    /// Supervise the current session until it ends (true) or the supervisor
    /// shuts down (false).
    async fn supervise(
        &self,
        events: &mut broadcast::Receiver<SessionEvent>,
        shutdown: &CancellationToken,
    ) -> bool {
        let timing = self.timing;
        let mut activity = self.store.subscribe_activity();
        let start = Instant::now();
        let mut refresh =
            tokio::time::interval_at(start + timing.refresh_interval, timing.refresh_interval);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut expiry = tokio::time::interval_at(
            start + timing.expiry_check_interval,
            timing.expiry_check_interval,
        );
        expiry.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut failures = 0u32;

        loop {
            // Deadlines follow the store's last activity, so activity re-arms them.
            let idle = self.store.time_since_last_activity();
            let now = Instant::now();
            let warn_at = now + timing.idle_warning_after.saturating_sub(idle);
            let logout_at = now + timing.idle_timeout.saturating_sub(idle);
            let warned = self.state() == SupervisorState::IdleWarning;

            let input = tokio::select! {
                _ = shutdown.cancelled() => return false,
                changed = activity.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                    SupervisorInput::Activity
                }
                _ = tokio::time::sleep_until(warn_at), if !warned => SupervisorInput::WarningElapsed,
                _ = tokio::time::sleep_until(logout_at) => SupervisorInput::IdleElapsed,
                _ = refresh.tick() => {
                    // The flight runs on its own task; only the wait is raced.
                    // At the idle deadline, fall back to the loop to recheck activity.
                    let outcome = tokio::select! {
                        _ = shutdown.cancelled() => return false,
                        _ = tokio::time::sleep_until(logout_at) => None,
                        outcome = self.proactive_refresh(&mut failures) => outcome,
                    };
                    match outcome {
                        Some(input) => input,
                        None => continue,
                    }
                }
                _ = expiry.tick() => {
                    if self.coordinator.is_in_flight() || !self.store.is_credential_expired() {
                        continue;
                    }
                    tracing::info!("credential expired");
                    SupervisorInput::CredentialExpired
                }
                event = events.recv() => match event {
                    // A termination always clears the store first; if a session is
                    // present the event belongs to an earlier one.
                    Ok(SessionEvent::Terminated { reason }) if !self.store.is_authenticated() => {
                        SupervisorInput::Terminated(reason)
                    }
                    Ok(SessionEvent::Authenticated { .. }) => SupervisorInput::Authenticated,
                    Ok(_) => continue,
                    Err(RecvError::Lagged(n)) => {
                        tracing::debug!(skipped = n, "supervisor lagged on events");
                        continue;
                    }
                    Err(RecvError::Closed) => return false,
                },
            };

            let effects = self.apply(input);
            self.run_effects(&effects);
            if !self.state().is_live() {
                return true;
            }
        }
    }

    async fn proactive_refresh(&self, failures: &mut u32) -> Option<SupervisorInput> {
        if self.store.time_since_last_activity() >= self.timing.idle_timeout {
            tracing::debug!("skipping proactive refresh, session idle");
            return None;
        }
        match self.coordinator.refresh(RefreshOrigin::Proactive).await {
            Ok(_) => {
                *failures = 0;
                None
            }
            // Terminal failures already cleared the store; the event follows.
            Err(_) if !self.store.is_authenticated() => None,
            Err(e) => {
                *failures += 1;
                let terminal = *failures >= self.timing.max_refresh_failures;
                tracing::warn!(err = %e, failures = *failures, terminal, "proactive refresh failed");
                Some(SupervisorInput::RefreshFailed { terminal })
            }
        }
    }

    fn apply(&self, input: SupervisorInput) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.state_tx.send_if_modified(|state| {
            let step = machine::transition(*state, input);
            effects = step.effects;
            if step.next == *state {
                return false;
            }
            tracing::debug!(from = %state, to = %step.next, ?input, "supervisor transition");
            *state = step.next;
            true
        });
        effects
    }

    fn run_effects(&self, effects: &[Effect]) {
        for effect in effects {
            match *effect {
                Effect::ArmTimers => self.monitor.attach(),
                Effect::EmitIdleWarning => {
                    let remaining = self
                        .timing
                        .idle_timeout
                        .saturating_sub(self.store.time_since_last_activity());
                    let remaining_secs = remaining.as_millis().div_ceil(1000) as u64;
                    tracing::info!(remaining_secs, "session idle");
                    self.events.emit(SessionEvent::IdleWarning { remaining_secs });
                }
                Effect::ClearSession(reason) => {
                    self.events.terminate(&self.store, reason);
                }
                Effect::CancelTimers => self.monitor.detach(),
            }
        }
    }
}

impl std::fmt::Debug for SessionSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSupervisor")
            .field("state", &self.state())
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
