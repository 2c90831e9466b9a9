// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed access to the persisted session (token + user profile).

use super::keys;
use super::storage::KeyValueStorage;
use crate::error::{AuthError, Result};
use crate::models::UserProfile;
use serde_json::Value;
use std::sync::Arc;

/// Session store over a key-value backend.
///
/// Reads never fail: unreadable or malformed entries are logged and treated
/// as absent.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Persist a new session: token first, then profile.
    pub fn save(&self, token: &str, profile: &UserProfile) -> Result<()> {
        self.save_token(token)?;
        self.save_profile(profile)
    }

    pub fn save_token(&self, token: &str) -> Result<()> {
        self.storage.set(keys::TOKEN, token)
    }

    pub fn save_profile(&self, profile: &UserProfile) -> Result<()> {
        let json =
            serde_json::to_string(profile).map_err(|e| AuthError::Storage(e.to_string()))?;
        self.storage.set(keys::USER, &json)
    }

    /// Stored token, absent when missing or empty.
    pub fn token(&self) -> Option<String> {
        match self.storage.get(keys::TOKEN) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read session token");
                None
            }
        }
    }

    /// Stored profile, if it has the minimum expected shape.
    pub fn load(&self) -> Option<UserProfile> {
        let raw = match self.storage.get(keys::USER) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored user profile");
                return None;
            }
        };

        match parse_profile(&raw) {
            Ok(profile) => Some(profile),
            Err(reason) => {
                tracing::warn!(reason = %reason, "Ignoring malformed stored user profile");
                None
            }
        }
    }

    /// Remove both session entries.
    pub fn clear(&self) {
        for key in [keys::TOKEN, keys::USER] {
            if let Err(e) = self.storage.remove(key) {
                tracing::warn!(key, error = %e, "Failed to remove session entry");
            }
        }
    }
}

fn parse_profile(raw: &str) -> std::result::Result<UserProfile, String> {
    let value: Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;

    let has_text = |field: &str| {
        value
            .get(field)
            .and_then(Value::as_str)
            .is_some_and(|s| !s.is_empty())
    };
    if !value.is_object() || !has_text("id") || !has_text("email") {
        return Err("missing id or email".to_string());
    }

    serde_json::from_value(value).map_err(|e| e.to_string())
}
