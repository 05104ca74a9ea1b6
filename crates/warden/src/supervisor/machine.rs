// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor state machine. Pure: no timers, no I/O.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::events::TerminationReason;

/// Lifecycle state of the supervised session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum SupervisorState {
    Unauthenticated,
    Active,
    IdleWarning,
    Terminated(TerminationReason),
}

impl SupervisorState {
    /// Whether a session is being supervised (timers running).
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Active | Self::IdleWarning)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Active => "active",
            Self::IdleWarning => "idle_warning",
            Self::Terminated(TerminationReason::Idle) => "terminated_idle",
            Self::Terminated(TerminationReason::Expired) => "terminated_expired",
            Self::Terminated(TerminationReason::Manual) => "terminated_manual",
        }
    }
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something the supervisor observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorInput {
    /// A session was stored.
    Authenticated,
    /// The user interacted.
    Activity,
    /// Idle-warning deadline passed.
    WarningElapsed,
    /// Idle-logout deadline passed.
    IdleElapsed,
    /// The periodic check found the credential expired.
    CredentialExpired,
    /// A proactive renewal failed; `terminal` when it cannot be retried.
    RefreshFailed { terminal: bool },
    /// Explicit logout.
    Logout,
    /// Another component already ended the session.
    Terminated(TerminationReason),
    /// The UI handled a termination.
    Acknowledge,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// (Re)arm idle timers and listen for activity.
    ArmTimers,
    EmitIdleWarning,
    /// Clear the store and announce the reason.
    ClearSession(TerminationReason),
    /// Stop all timers and activity listening.
    CancelTimers,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub next: SupervisorState,
    pub effects: Vec<Effect>,
}

impl Step {
    fn stay(state: SupervisorState) -> Self {
        Self { next: state, effects: Vec::new() }
    }

    fn to(next: SupervisorState, effects: &[Effect]) -> Self {
        Self { next, effects: effects.to_vec() }
    }

    fn terminate(reason: TerminationReason) -> Self {
        Self::to(
            SupervisorState::Terminated(reason),
            &[Effect::ClearSession(reason), Effect::CancelTimers],
        )
    }
}

pub fn transition(state: SupervisorState, input: SupervisorInput) -> Step {
    use SupervisorInput as In;
    use SupervisorState as S;

    match (state, input) {
        (_, In::Authenticated) => Step::to(S::Active, &[Effect::ArmTimers]),

        (S::Active | S::IdleWarning, In::Activity) => Step::to(S::Active, &[Effect::ArmTimers]),
        (S::Active, In::WarningElapsed) => Step::to(S::IdleWarning, &[Effect::EmitIdleWarning]),
        (S::Active | S::IdleWarning, In::IdleElapsed) => Step::terminate(TerminationReason::Idle),
        (S::Active | S::IdleWarning, In::CredentialExpired)
        | (S::Active | S::IdleWarning, In::RefreshFailed { terminal: true }) => {
            Step::terminate(TerminationReason::Expired)
        }
        (S::Active | S::IdleWarning, In::Logout) => Step::terminate(TerminationReason::Manual),
        (S::Active | S::IdleWarning, In::Terminated(reason)) => {
            Step::to(S::Terminated(reason), &[Effect::CancelTimers])
        }

        (S::Terminated(_), In::Acknowledge) => Step::stay(S::Unauthenticated),

        (state, _) => Step::stay(state),
    }
}

#[cfg(test)]
#[path = "machine_tests.rs"]
mod tests;
