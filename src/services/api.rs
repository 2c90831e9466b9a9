// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dojo REST API client.
//!
//! Handles:
//! - Registration and login (user and admin)
//! - Startup token check and token refresh with an explicit bearer token
//! - Building the profile request sent through the interceptor
//! - Mapping HTTP failures to `AuthError` kinds (network, 401, 403, other)

use crate::config::Config;
use crate::error::AuthError;
use crate::models::{
    AdminLoginCredentials, AuthResponse, LoginCredentials, ProfileResponse,
    RefreshTokenResponse, Registration,
};
use serde::{Deserialize, Serialize};

/// Dojo API client.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the configured base path.
    pub fn new(config: &Config) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| AuthError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(http, &config.api_url))
    }

    /// Create a client around an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Register a new user.
    pub async fn register(&self, data: &Registration) -> Result<AuthResponse, AuthError> {
        self.post_json("/registro", data, None).await
    }

    /// Log in a regular user.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, AuthError> {
        self.post_json("/login", credentials, None).await
    }

    /// Log in an administrator.
    pub async fn login_admin(
        &self,
        credentials: &AdminLoginCredentials,
    ) -> Result<AuthResponse, AuthError> {
        self.post_json("/admin/login", credentials, None).await
    }

    /// Get the profile of the token's owner.
    pub async fn profile(&self, access_token: &str) -> Result<ProfileResponse, AuthError> {
        let response = self
            .http
            .get(self.url("/auth/perfil"))
            .bearer_auth(access_token)
            .send()
            .await?;

        check_response_json(response).await
    }

    /// Unauthenticated `GET /auth/perfil`, for the interceptor to sign.
    pub(crate) fn profile_request(&self) -> Result<reqwest::Request, AuthError> {
        Ok(self.http.get(self.url("/auth/perfil")).build()?)
    }

    /// Exchange the current token for a fresh one.
    pub async fn refresh_token(
        &self,
        access_token: &str,
    ) -> Result<RefreshTokenResponse, AuthError> {
        self.post_json("/refresh-token", &serde_json::json!({}), Some(access_token))
            .await
    }

    /// Generic POST with JSON request and response.
    async fn post_json<B: Serialize + ?Sized, T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
        access_token: Option<&str>,
    ) -> Result<T, AuthError> {
        let mut request = self.http.post(self.url(path)).json(body);
        if let Some(token) = access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        check_response_json(response).await
    }
}

/// Check response status and return error if not successful.
pub(crate) async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, AuthError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    // 403s on authorized requests are already reported by the interceptor.
    tracing::debug!(status, body = %body, "API request failed");

    Err(AuthError::from_status(status, &body))
}

/// Check response and parse JSON body.
pub(crate) async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AuthError> {
    let response = check_response(response).await?;

    response
        .json()
        .await
        .map_err(|e| AuthError::MalformedResponse(format!("JSON parse error: {}", e)))
}
