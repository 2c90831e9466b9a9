// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Navigation guards.
//!
//! Each guard is a pure function of a `SessionSnapshot` and the requested
//! route. It never navigates: it returns either `Proceed` or a `Redirect`
//! for the caller to act on. Redirects carry the requested URL as
//! `returnUrl` so the UI can send the user back after logging in.

use crate::models::Privilege;
use crate::services::auth::{SessionSnapshot, LOGIN_PATH};
use serde::Deserialize;

pub const USER_DASHBOARD_PATH: &str = "/dashboard";
pub const ADMIN_DASHBOARD_PATH: &str = "/admin/dashboard";

/// Where to send the user instead of the requested route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Redirect {
    fn to(path: &str, return_url: &str) -> Self {
        Self {
            path: path.to_string(),
            query: vec![("returnUrl".to_string(), return_url.to_string())],
        }
    }

    fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.insert(self.query.len() - 1, (key.to_string(), value.into()));
        self
    }

    /// Value of a query parameter.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn return_url(&self) -> Option<&str> {
        self.query_value("returnUrl")
    }

    /// Path plus url-encoded query string.
    pub fn to_url(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }

        let query: Vec<String> = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect();
        format!("{}?{}", self.path, query.join("&"))
    }
}

/// Result of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Proceed,
    Redirect(Redirect),
}

impl GuardOutcome {
    pub fn is_proceed(&self) -> bool {
        matches!(self, GuardOutcome::Proceed)
    }

    pub fn redirect(&self) -> Option<&Redirect> {
        match self {
            GuardOutcome::Proceed => None,
            GuardOutcome::Redirect(r) => Some(r),
        }
    }
}

/// Privilege requirement attached to a route: one name or a list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PrivilegeRequirement {
    One(Privilege),
    All(Vec<Privilege>),
}

impl PrivilegeRequirement {
    pub fn to_list(&self) -> Vec<Privilege> {
        match self {
            PrivilegeRequirement::One(p) => vec![*p],
            PrivilegeRequirement::All(list) => list.clone(),
        }
    }
}

/// Static data declared on a route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RouteData {
    #[serde(rename = "privilegio", default)]
    pub privilege: Option<PrivilegeRequirement>,
}

/// Route being navigated to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteRequest {
    /// Requested URL, preserved as `returnUrl`
    pub url: String,
    pub data: RouteData,
}

impl RouteRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            data: RouteData::default(),
        }
    }

    pub fn with_privilege(mut self, requirement: PrivilegeRequirement) -> Self {
        self.data.privilege = Some(requirement);
        self
    }
}

/// Signature shared by all guards.
pub type Guard = fn(&SessionSnapshot, &RouteRequest) -> GuardOutcome;

/// Requires an active session.
pub fn auth_guard(session: &SessionSnapshot, route: &RouteRequest) -> GuardOutcome {
    if session.is_authenticated() {
        return GuardOutcome::Proceed;
    }
    GuardOutcome::Redirect(Redirect::to(LOGIN_PATH, &route.url))
}

/// Requires an admin-tier session. Signed-in users without the role go to
/// their own dashboard rather than the login page.
pub fn admin_guard(session: &SessionSnapshot, route: &RouteRequest) -> GuardOutcome {
    let is_auth = session.is_authenticated();
    if is_auth && session.is_admin() {
        return GuardOutcome::Proceed;
    }

    let target = if is_auth { USER_DASHBOARD_PATH } else { LOGIN_PATH };
    GuardOutcome::Redirect(Redirect::to(target, &route.url))
}

/// Requires a webmaster session.
pub fn super_admin_guard(session: &SessionSnapshot, route: &RouteRequest) -> GuardOutcome {
    let is_auth = session.is_authenticated();
    if is_auth && session.is_super_admin() {
        return GuardOutcome::Proceed;
    }

    let target = if is_auth && session.is_admin() {
        ADMIN_DASHBOARD_PATH
    } else if is_auth {
        USER_DASHBOARD_PATH
    } else {
        LOGIN_PATH
    };
    GuardOutcome::Redirect(Redirect::to(target, &route.url))
}

/// Requires an admin-tier session holding every privilege the route lists.
///
/// Routes without a requirement always proceed. Denials carry
/// `denied=privilege` and the missing privileges in `need`.
pub fn privilege_guard(session: &SessionSnapshot, route: &RouteRequest) -> GuardOutcome {
    let Some(required) = route.data.privilege.as_ref() else {
        return GuardOutcome::Proceed;
    };

    let is_auth = session.is_authenticated();
    let is_admin = session.is_admin();
    // Privileges only count for admin-tier users.
    let missing: Vec<Privilege> = required
        .to_list()
        .into_iter()
        .filter(|p| !(is_admin && session.has_privilege(*p)))
        .collect();

    if is_auth && is_admin && missing.is_empty() {
        return GuardOutcome::Proceed;
    }

    let target = if is_auth { ADMIN_DASHBOARD_PATH } else { LOGIN_PATH };
    let need: Vec<&str> = missing.iter().map(|p| p.as_str()).collect();

    GuardOutcome::Redirect(
        Redirect::to(target, &route.url)
            .with("denied", "privilege")
            .with("need", need.join(",")),
    )
}

/// Keeps signed-in users off the login surface, sending them to their
/// role's dashboard.
pub fn no_auth_guard(session: &SessionSnapshot, route: &RouteRequest) -> GuardOutcome {
    match session.role() {
        Some(role) if session.is_authenticated() => {
            GuardOutcome::Redirect(Redirect::to(role.dashboard_path(), &route.url))
        }
        _ => GuardOutcome::Proceed,
    }
}
