// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    message = { 400, r#"{"status":400,"error":"Bad Request","message":"name is required"}"#, "name is required" },
    error_only = { 404, r#"{"status":404,"error":"Not Found"}"#, "Not Found" },
    empty_message = { 409, r#"{"error":"Conflict","message":""}"#, "Conflict" },
    plain_text = { 502, "upstream down\n", "upstream down" },
    empty = { 500, "", "HTTP 500" },
)]
fn extracts_error_message(status: u16, body: &str, expected: &str) {
    assert_eq!(error_message(status, body), expected);
}

#[yare::parameterized(
    rejected = { RefreshError::Rejected("401".to_owned()), true },
    no_session = { RefreshError::NoSession, true },
    transport = { RefreshError::Transport("timeout".to_owned()), false },
)]
fn refresh_terminality(err: RefreshError, terminal: bool) {
    assert_eq!(err.is_terminal(), terminal);
}

#[test]
fn codes_are_stable() {
    assert_eq!(SessionError::SessionExpired.as_str(), "SESSION_EXPIRED");
    assert_eq!(SessionError::NotAuthenticated.as_str(), "NOT_AUTHENTICATED");
    let err = SessionError::Request { status: 403, message: "forbidden".to_owned() };
    assert_eq!(err.status(), Some(403));
    assert_eq!(err.to_string(), "request failed (403): forbidden");
}
