// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile model persisted alongside the session token.

use crate::guards::{ADMIN_DASHBOARD_PATH, USER_DASHBOARD_PATH};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Access tier of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(alias = "usuario")]
    User,
    Admin,
    Webmaster,
}

impl Role {
    /// Admin tier: admins and webmasters.
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin | Role::Webmaster)
    }

    /// Landing page for this role after login.
    pub fn dashboard_path(self) -> &'static str {
        if self.is_admin() {
            ADMIN_DASHBOARD_PATH
        } else {
            USER_DASHBOARD_PATH
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Webmaster => "webmaster",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" | "usuario" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            "webmaster" => Ok(Role::Webmaster),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Named capability flag granted to admin-tier users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Privilege {
    #[serde(rename = "gestionarUsuarios")]
    ManageUsers,
    #[serde(rename = "gestionarContenido")]
    ManageContent,
    #[serde(rename = "verReportes")]
    ViewReports,
    #[serde(rename = "configurarSistema")]
    ConfigureSystem,
}

impl Privilege {
    pub const ALL: [Privilege; 4] = [
        Privilege::ManageUsers,
        Privilege::ManageContent,
        Privilege::ViewReports,
        Privilege::ConfigureSystem,
    ];

    /// Wire name of the privilege key.
    pub fn as_str(self) -> &'static str {
        match self {
            Privilege::ManageUsers => "gestionarUsuarios",
            Privilege::ManageContent => "gestionarContenido",
            Privilege::ViewReports => "verReportes",
            Privilege::ConfigureSystem => "configurarSistema",
        }
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Privilege {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Privilege::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown privilege: {s}"))
    }
}

/// Set of privileges held by a user.
///
/// On the wire this is an object of privilege name to boolean. Only keys
/// whose value is exactly `true` are held; unknown keys are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, Value>",
    into = "BTreeMap<String, bool>"
)]
pub struct Privileges(BTreeSet<Privilege>);

impl Privileges {
    pub fn contains(&self, privilege: Privilege) -> bool {
        self.0.contains(&privilege)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Privilege> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Privilege> for Privileges {
    fn from_iter<I: IntoIterator<Item = Privilege>>(iter: I) -> Self {
        Privileges(iter.into_iter().collect())
    }
}

impl From<BTreeMap<String, Value>> for Privileges {
    fn from(map: BTreeMap<String, Value>) -> Self {
        map.into_iter()
            .filter(|(_, granted)| *granted == Value::Bool(true))
            .filter_map(|(key, _)| match key.parse::<Privilege>() {
                Ok(p) => Some(p),
                Err(_) => {
                    tracing::debug!(key = %key, "Ignoring unknown privilege key");
                    None
                }
            })
            .collect()
    }
}

impl From<Privileges> for BTreeMap<String, bool> {
    fn from(privileges: Privileges) -> Self {
        privileges
            .0
            .into_iter()
            .map(|p| (p.as_str().to_string(), true))
            .collect()
    }
}

/// User profile as published to guards and persisted next to the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserProfile {
    pub id: String,
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(
        rename = "privilegios",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    #[cfg_attr(
        feature = "binding-generation",
        ts(type = "Record<string, boolean> | null")
    )]
    pub privileges: Option<Privileges>,
}

impl UserProfile {
    /// True iff the privilege map holds `privilege` as `true`.
    pub fn has_privilege(&self, privilege: Privilege) -> bool {
        self.privileges
            .as_ref()
            .is_some_and(|p| p.contains(privilege))
    }
}
