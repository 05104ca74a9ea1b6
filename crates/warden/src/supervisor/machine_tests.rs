// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::events::TerminationReason::{Expired, Idle, Manual};
use SupervisorInput as In;
use SupervisorState as S;

#[yare::parameterized(
    login = { S::Unauthenticated, In::Authenticated, S::Active },
    relogin_after_idle = { S::Terminated(Idle), In::Authenticated, S::Active },
    activity_keeps_active = { S::Active, In::Activity, S::Active },
    warning = { S::Active, In::WarningElapsed, S::IdleWarning },
    activity_cancels_warning = { S::IdleWarning, In::Activity, S::Active },
    idle_logout = { S::IdleWarning, In::IdleElapsed, S::Terminated(Idle) },
    idle_logout_without_warning = { S::Active, In::IdleElapsed, S::Terminated(Idle) },
    expired = { S::Active, In::CredentialExpired, S::Terminated(Expired) },
    expired_during_warning = { S::IdleWarning, In::CredentialExpired, S::Terminated(Expired) },
    refresh_terminal = { S::Active, In::RefreshFailed { terminal: true }, S::Terminated(Expired) },
    refresh_transient = { S::Active, In::RefreshFailed { terminal: false }, S::Active },
    manual = { S::Active, In::Logout, S::Terminated(Manual) },
    manual_during_warning = { S::IdleWarning, In::Logout, S::Terminated(Manual) },
    external = { S::Active, In::Terminated(Expired), S::Terminated(Expired) },
    acknowledge = { S::Terminated(Manual), In::Acknowledge, S::Unauthenticated },
    warning_once = { S::IdleWarning, In::WarningElapsed, S::IdleWarning },
    unauthenticated_ignores_timers = { S::Unauthenticated, In::IdleElapsed, S::Unauthenticated },
    unauthenticated_ignores_logout = { S::Unauthenticated, In::Logout, S::Unauthenticated },
    terminated_ignores_activity = { S::Terminated(Idle), In::Activity, S::Terminated(Idle) },
    terminated_keeps_first_reason = { S::Terminated(Idle), In::Terminated(Manual), S::Terminated(Idle) },
)]
fn next_state(from: SupervisorState, input: SupervisorInput, expected: SupervisorState) {
    assert_eq!(transition(from, input).next, expected);
}

#[test]
fn warning_touches_nothing_but_the_ui() {
    let step = transition(S::Active, In::WarningElapsed);
    assert_eq!(step.effects, vec![Effect::EmitIdleWarning]);
}

#[test]
fn idle_logout_clears_and_cancels() {
    let step = transition(S::IdleWarning, In::IdleElapsed);
    assert_eq!(step.effects, vec![Effect::ClearSession(Idle), Effect::CancelTimers]);
}

#[test]
fn external_termination_does_not_clear_again() {
    let step = transition(S::Active, In::Terminated(Expired));
    assert_eq!(step.effects, vec![Effect::CancelTimers]);
}

#[test]
fn activity_rearms_timers() {
    let step = transition(S::IdleWarning, In::Activity);
    assert_eq!(step.effects, vec![Effect::ArmTimers]);
}

#[test]
fn no_effects_outside_live_states() {
    for input in [
        In::Activity,
        In::WarningElapsed,
        In::IdleElapsed,
        In::CredentialExpired,
        In::RefreshFailed { terminal: true },
        In::Logout,
        In::Terminated(Manual),
    ] {
        assert!(transition(S::Unauthenticated, input).effects.is_empty(), "{input:?}");
        assert!(transition(S::Terminated(Expired), input).effects.is_empty(), "{input:?}");
    }
}

#[test]
fn state_names() {
    assert_eq!(S::Terminated(Idle).to_string(), "terminated_idle");
    assert_eq!(S::IdleWarning.to_string(), "idle_warning");
    assert!(S::IdleWarning.is_live());
    assert!(!S::Terminated(Manual).is_live());
}
