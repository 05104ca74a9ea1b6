// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Route guard for the dashboard views.

use crate::session::Identity;

pub const LOGIN_ROUTE: &str = "/auth/login";
pub const CHANGE_PASSWORD_ROUTE: &str = "/auth/change-password";
pub const DASHBOARD_ROUTE: &str = "/dashboard";

const PUBLIC_ROUTES: &[&str] = &[
    "/about",
    "/projects",
    "/gallery",
    "/get-involved",
    "/donate",
    "/contact",
    LOGIN_ROUTE,
    "/auth/reset-password",
];

/// Outcome of a navigation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    RedirectLogin,
    RedirectChangePassword,
    RedirectDashboard,
}

impl RouteDecision {
    /// Where to send the user, if anywhere.
    pub fn target(&self) -> Option<&'static str> {
        match self {
            Self::Allow => None,
            Self::RedirectLogin => Some(LOGIN_ROUTE),
            Self::RedirectChangePassword => Some(CHANGE_PASSWORD_ROUTE),
            Self::RedirectDashboard => Some(DASHBOARD_ROUTE),
        }
    }
}

pub struct RouteGuard;

impl RouteGuard {
    /// Decide whether `identity` (None when logged out) may open `path`.
    pub fn decide(path: &str, identity: Option<&Identity>) -> RouteDecision {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        let change_password = under(path, CHANGE_PASSWORD_ROUTE);
        if !change_password && is_public(path) {
            return RouteDecision::Allow;
        }
        let protected = change_password || under(path, DASHBOARD_ROUTE);

        match identity {
            None if protected => RouteDecision::RedirectLogin,
            None => RouteDecision::Allow,
            Some(id) if change_password && !id.must_change_password => {
                RouteDecision::RedirectDashboard
            }
            Some(id) if protected && !change_password && id.must_change_password => {
                RouteDecision::RedirectChangePassword
            }
            Some(_) => RouteDecision::Allow,
        }
    }
}

fn is_public(path: &str) -> bool {
    path == "/" || PUBLIC_ROUTES.iter().any(|route| under(path, route))
}

/// `path` is `route` or one of its sub-paths.
fn under(path: &str, route: &str) -> bool {
    match path.strip_prefix(route) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
#[path = "guard_tests.rs"]
mod tests;
