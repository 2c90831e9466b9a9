// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request and response bodies of the dojo REST API.

use super::user::{Privileges, Role, UserProfile};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::{Validate, ValidationError};

/// Credentials for the regular login form.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginCredentials {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
}

/// Credentials for the admin login form.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AdminLoginCredentials {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    /// Optional second factor code
    #[serde(rename = "codigo2FA", skip_serializing_if = "Option::is_none")]
    pub two_factor_code: Option<String>,
}

/// Registration form data.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Registration {
    #[serde(rename = "nombre")]
    #[validate(length(min = 3, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 50))]
    pub password: String,
    /// Form-only confirmation, never sent to the API
    #[serde(rename = "confirmarPassword", skip_serializing, default)]
    #[validate(must_match(other = "password"))]
    pub confirm_password: String,
    #[serde(rename = "edad", skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 18, max = 120))]
    pub age: Option<u8>,
    #[serde(rename = "telefono", skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
}

/// Phone numbers are exactly ten digits.
fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone.len() == 10 && phone.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("phone"))
    }
}

/// Response of login, admin login and registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthResponse {
    #[serde(rename = "mensaje", default)]
    pub message: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    /// Profile returned by user flows
    #[serde(rename = "usuario", default)]
    pub user: Option<UserProfile>,
    /// Profile returned by admin login
    #[serde(default)]
    pub admin: Option<UserProfile>,
}

/// Response of the token refresh endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenResponse {
    pub token: String,
}

/// Profile as returned by `GET /auth/perfil`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileResponse {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(rename = "privilegios", default)]
    #[cfg_attr(
        feature = "binding-generation",
        ts(type = "Record<string, boolean> | null")
    )]
    pub privileges: Option<Privileges>,
}

/// Payload for creating an admin-tier user.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewAdminUser {
    #[serde(rename = "nombre")]
    #[validate(length(min = 3, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 50))]
    pub password: String,
    pub role: Role,
}

/// Entry of the admin user listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserListing {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Registration timestamp (ISO 8601)
    #[serde(rename = "fechaRegistro", default)]
    pub registered_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAdminResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "usuario")]
    pub user: UserListing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserListResponse {
    #[serde(rename = "usuarios")]
    pub users: Vec<UserListing>,
}
