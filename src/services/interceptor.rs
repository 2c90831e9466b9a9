// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer-token attachment with refresh-and-replay on 401.
//!
//! Every request gets `Authorization: Bearer <token>` when a session token
//! is stored. A 401 triggers one token refresh and one replay of the
//! original request. Concurrent 401s share a single in-flight refresh
//! instead of each starting their own.

use crate::error::{AuthError, Result};
use crate::services::auth::AuthService;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Request, Response, StatusCode};
use std::sync::{Arc, Mutex, PoisonError};

type RefreshFuture = Shared<BoxFuture<'static, Result<String>>>;

/// Shared slot holding the refresh currently in progress, if any.
pub(crate) type InFlight = Arc<Mutex<Option<RefreshFuture>>>;

/// HTTP executor that manages the session token for outgoing requests.
#[derive(Clone)]
pub struct AuthInterceptor {
    http: reqwest::Client,
    auth: AuthService,
    in_flight: InFlight,
}

impl AuthInterceptor {
    /// Interceptors built from clones of one `AuthService` share its
    /// in-flight refresh.
    pub fn new(auth: AuthService) -> Self {
        Self {
            http: auth.api().http().clone(),
            in_flight: auth.refresh_in_flight(),
            auth,
        }
    }

    /// Send `request` with the session token attached.
    ///
    /// Non-401 responses are returned untouched (403 is logged). On a 401
    /// the token is refreshed and the request replayed exactly once; the
    /// replay's response is returned whatever its status. If the refresh
    /// fails the session has been closed and the original 401 is returned
    /// as an error.
    pub async fn execute(&self, request: Request) -> Result<Response> {
        let replay = request.try_clone();
        let token = self.auth.token();

        let request = with_bearer(request, token.as_deref())?;
        let method = request.method().clone();
        let url = request.url().clone();

        let response = self.http.execute(request).await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => {}
            StatusCode::FORBIDDEN => {
                tracing::warn!(%method, %url, "Access denied (403)");
                return Ok(response);
            }
            _ => return Ok(response),
        }

        // Without a token there is nothing to refresh.
        let Some(sent_with) = token else {
            return Ok(response);
        };

        let body = response.text().await.unwrap_or_default();
        let original = AuthError::from_status(401, &body);

        let Some(replay) = replay else {
            tracing::warn!(%method, %url, "Request body cannot be replayed, skipping refresh");
            return Err(original);
        };

        match self.refreshed_token(&sent_with).await {
            Ok(new_token) => {
                tracing::debug!(%method, %url, "Replaying request with refreshed token");
                let retry = with_bearer(replay, Some(&new_token))?;
                Ok(self.http.execute(retry).await?)
            }
            Err(e) => {
                tracing::debug!(error = %e, %method, %url, "Refresh failed, returning original 401");
                Err(original)
            }
        }
    }

    /// Token to replay with after a 401 on a request sent with `sent_with`.
    ///
    /// Joins the in-flight refresh when there is one. If the stored token
    /// already differs from `sent_with`, a refresh finished after this
    /// request went out and its token is used directly.
    async fn refreshed_token(&self, sent_with: &str) -> Result<String> {
        let refresh = {
            let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);

            match slot.as_ref() {
                Some(refresh) => refresh.clone(),
                None => {
                    match self.auth.token() {
                        Some(current) if current != sent_with => return Ok(current),
                        None => return Err(AuthError::NotAuthenticated),
                        Some(_) => {}
                    }

                    let refresh = start_refresh(self.auth.clone(), self.in_flight.clone());
                    *slot = Some(refresh.clone());
                    refresh
                }
            }
        };

        refresh.await
    }
}

/// Build the shared refresh future. It empties the slot once it resolves.
fn start_refresh(auth: AuthService, in_flight: InFlight) -> RefreshFuture {
    async move {
        let result = auth.refresh_token().await;
        *in_flight.lock().unwrap_or_else(PoisonError::into_inner) = None;
        result
    }
    .boxed()
    .shared()
}

fn with_bearer(mut request: Request, token: Option<&str>) -> Result<Request> {
    if let Some(token) = token {
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| AuthError::Storage("stored token is not a valid header value".to_string()))?;
        request.headers_mut().insert(AUTHORIZATION, value);
    }
    Ok(request)
}
