// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-flight credential renewal.
//!
//! At most one renewal is outstanding process-wide. Every caller, reactive
//! or proactive, joins a FIFO waiter queue; the caller that finds no flight
//! in progress also starts one. The flight runs on its own task so it
//! always settles, and settling drains the whole queue exactly once.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::credential::{RefreshGateway, RenewedCredential};
use crate::error::RefreshError;
use crate::events::{RefreshOrigin, SessionEvent, SessionEvents, TerminationReason};
use crate::session::SessionStore;

/// Outcome delivered to each waiter: the token to retry with.
pub type RefreshOutcome = Result<String, RefreshError>;

struct Waiter {
    origin: RefreshOrigin,
    tx: oneshot::Sender<RefreshOutcome>,
}

#[derive(Default)]
struct Flight {
    in_flight: bool,
    waiters: VecDeque<Waiter>,
}

/// The session a flight was started for.
#[derive(Debug, Clone, Copy)]
struct FlightContext {
    started_by: RefreshOrigin,
    generation: u64,
}

pub struct RefreshCoordinator {
    gateway: Arc<dyn RefreshGateway>,
    store: Arc<SessionStore>,
    events: SessionEvents,
    flight: Mutex<Flight>,
    flights: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new(
        gateway: Arc<dyn RefreshGateway>,
        store: Arc<SessionStore>,
        events: SessionEvents,
    ) -> Arc<Self> {
        Arc::new(Self {
            gateway,
            store,
            events,
            flight: Mutex::new(Flight::default()),
            flights: AtomicU64::new(0),
        })
    }

    /// Renew the credential, joining the outstanding renewal if there is one.
    pub async fn refresh(self: &Arc<Self>, origin: RefreshOrigin) -> RefreshOutcome {
        let (tx, rx) = oneshot::channel();
        let start = {
            let mut flight = self.flight.lock();
            flight.waiters.push_back(Waiter { origin, tx });
            !std::mem::replace(&mut flight.in_flight, true)
        };

        if start {
            self.flights.fetch_add(1, Ordering::Relaxed);
            let ctx = FlightContext { started_by: origin, generation: self.store.generation() };
            tracing::debug!(%origin, generation = ctx.generation, "starting credential refresh");
            let this = Arc::clone(self);
            tokio::spawn(async move {
                let result = this.gateway.refresh().await;
                this.settle(ctx, result);
            });
        } else {
            tracing::debug!(%origin, "joining in-flight credential refresh");
        }

        // The sender is only dropped if the runtime shuts down mid-flight.
        rx.await.unwrap_or(Err(RefreshError::Transport("refresh abandoned".to_owned())))
    }

    /// Whether a renewal is outstanding.
    pub fn is_in_flight(&self) -> bool {
        self.flight.lock().in_flight
    }

    /// Number of callers waiting on the outstanding renewal.
    pub fn pending(&self) -> usize {
        self.flight.lock().waiters.len()
    }

    /// Number of renewals started since creation.
    pub fn flights(&self) -> u64 {
        self.flights.load(Ordering::Relaxed)
    }

    fn settle(&self, ctx: FlightContext, result: Result<RenewedCredential, RefreshError>) {
        let (outcome, waiters) = {
            let mut flight = self.flight.lock();
            let outcome = self.apply(ctx, result, &flight.waiters);
            let waiters = std::mem::take(&mut flight.waiters);
            flight.in_flight = false;
            (outcome, waiters)
        };

        // Released in arrival order.
        for waiter in waiters {
            let _ = waiter.tx.send(outcome.clone());
        }
    }

    /// Commit the renewal result to the store. Runs under the flight lock.
    ///
    /// A result for a session that has since ended (or been replaced) is
    /// dropped and never touches the store.
    fn apply(
        &self,
        ctx: FlightContext,
        result: Result<RenewedCredential, RefreshError>,
        waiters: &VecDeque<Waiter>,
    ) -> RefreshOutcome {
        let started_by = ctx.started_by;
        if self.store.generation() != ctx.generation {
            tracing::info!(origin = %started_by, ok = result.is_ok(), "refresh settled after session ended, discarding");
            return Err(RefreshError::NoSession);
        }
        match result {
            Ok(renewed) => {
                let stored = self.store.update_credential_if(
                    ctx.generation,
                    renewed.token.clone(),
                    renewed.lifetime_secs,
                );
                if !stored {
                    tracing::info!("credential renewed after session ended, discarding");
                    return Err(RefreshError::NoSession);
                }
                tracing::info!(origin = %started_by, lifetime_secs = renewed.lifetime_secs, "credential refreshed");
                self.events.emit(SessionEvent::Refreshed {
                    origin: started_by,
                    expires_in_secs: renewed.lifetime_secs,
                });
                Ok(renewed.token)
            }
            Err(e) => {
                // A blocked reactive caller cannot wait for the next timer tick.
                let blocked = waiters.iter().any(|w| w.origin == RefreshOrigin::Reactive);
                let transient = !e.is_terminal() && !blocked;
                tracing::warn!(origin = %started_by, err = %e, transient, "credential refresh failed");
                self.events.emit(SessionEvent::RefreshFailed {
                    origin: started_by,
                    error: e.to_string(),
                    transient,
                });
                if !transient {
                    let reason = TerminationReason::Expired;
                    self.events.terminate_if(&self.store, ctx.generation, reason);
                }
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("in_flight", &self.is_in_flight())
            .field("flights", &self.flights())
            .finish()
    }
}

#[cfg(test)]
#[path = "refresh_tests.rs"]
mod tests;
