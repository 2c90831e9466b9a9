// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session lifecycle: login, registration, logout, profile and token refresh.
//!
//! `AuthService` is the only writer of the persisted session and of the
//! published current user. Guards, visibility gates and UI code read the
//! published value through `subscribe()` or `snapshot()`.

use crate::error::{AuthError, Result};
use crate::models::{
    AdminLoginCredentials, AuthResponse, LoginCredentials, Privilege, Privileges,
    ProfileResponse, Registration, Role, UserProfile,
};
use crate::services::api::{check_response_json, ApiClient};
use crate::services::interceptor::{AuthInterceptor, InFlight};
use crate::store::SessionStore;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use validator::Validate;

/// Public login surface, target of every forced logout.
pub const LOGIN_PATH: &str = "/auth";

const ADMIN_INVALID_CREDENTIALS: &str = "Credenciales de administrador inválidas";
const ADMIN_ACCESS_DENIED: &str = "Acceso denegado. Privilegios insuficientes";

/// Navigation side effect performed on logout.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Navigator that does nothing (headless use).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate(&self, _path: &str) {}
}

/// Immutable view of the session at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    has_token: bool,
    user: Option<UserProfile>,
}

impl SessionSnapshot {
    pub fn new(has_token: bool, user: Option<UserProfile>) -> Self {
        Self { has_token, user }
    }

    /// A token and a profile are both required.
    pub fn is_authenticated(&self) -> bool {
        self.has_token && self.user.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.role().is_some_and(Role::is_admin)
    }

    pub fn is_webmaster(&self) -> bool {
        self.role() == Some(Role::Webmaster)
    }

    pub fn is_super_admin(&self) -> bool {
        self.is_webmaster()
    }

    pub fn has_privilege(&self, privilege: Privilege) -> bool {
        self.user
            .as_ref()
            .is_some_and(|u| u.has_privilege(privilege))
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }
}

/// Which profile field of `AuthResponse` a flow expects.
#[derive(Clone, Copy)]
enum Flow {
    User,
    Admin,
}

/// Clears the loading flag when the operation ends, on any path.
struct LoadingGuard<'a>(&'a watch::Sender<bool>);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.send_replace(false);
    }
}

/// Authentication service.
#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
    store: SessionStore,
    navigator: Arc<dyn Navigator>,
    current_user: Arc<watch::Sender<Option<UserProfile>>>,
    loading: Arc<watch::Sender<bool>>,
    refresh_in_flight: InFlight,
}

impl AuthService {
    /// Create a service with no published user. Call `restore_session()`
    /// to pick up a persisted session.
    pub fn new(api: ApiClient, store: SessionStore, navigator: Arc<dyn Navigator>) -> Self {
        let (current_user, _) = watch::channel(None);
        let (loading, _) = watch::channel(false);

        Self {
            api,
            store,
            navigator,
            current_user: Arc::new(current_user),
            loading: Arc::new(loading),
            refresh_in_flight: Arc::new(Mutex::new(None)),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub(crate) fn refresh_in_flight(&self) -> InFlight {
        self.refresh_in_flight.clone()
    }

    // ─── Startup ─────────────────────────────────────────────────────────────

    /// Publish a persisted session and verify its token in the background.
    ///
    /// Returns `None` when there is nothing to restore. A failed check
    /// silently clears the session without navigating.
    pub fn restore_session(&self) -> Option<JoinHandle<()>> {
        let token = self.store.token()?;
        let profile = self.store.load()?;

        tracing::debug!(user_id = %profile.id, "Restoring persisted session");
        self.current_user.send_replace(Some(profile));

        let service = self.clone();
        Some(tokio::spawn(async move {
            if service.verify_token(&token).await {
                tracing::debug!("Persisted session verified");
                return;
            }

            // A login may have replaced the session while we were checking.
            if service.store.token().as_deref() == Some(token.as_str()) {
                tracing::info!("Persisted session rejected by API, clearing");
                service.end_session();
            }
        }))
    }

    /// True iff the API accepts `token`.
    pub async fn verify_token(&self, token: &str) -> bool {
        match self.api.profile(token).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(error = %e, "Token verification failed");
                false
            }
        }
    }

    // ─── Session establishment ───────────────────────────────────────────────

    /// Register a new user and start a session for them.
    pub async fn register(&self, data: &Registration) -> Result<AuthResponse> {
        data.validate()?;
        let _loading = self.start_loading();

        let response = self.api.register(data).await.inspect_err(|e| {
            tracing::warn!(error = %e, "Registration failed");
        })?;
        self.accept(response, Flow::User)
    }

    /// Log in a regular user.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse> {
        credentials.validate()?;
        let _loading = self.start_loading();

        let response = self.api.login(credentials).await.inspect_err(|e| {
            tracing::warn!(error = %e, "Login failed");
        })?;
        self.accept(response, Flow::User)
    }

    /// Log in an administrator.
    pub async fn login_admin(&self, credentials: &AdminLoginCredentials) -> Result<AuthResponse> {
        credentials.validate()?;
        let _loading = self.start_loading();

        let response = self.api.login_admin(credentials).await.map_err(|e| {
            tracing::warn!(error = %e, "Admin login failed");
            match e {
                AuthError::Unauthorized { .. } => e.with_message(ADMIN_INVALID_CREDENTIALS),
                AuthError::Forbidden { .. } => e.with_message(ADMIN_ACCESS_DENIED),
                other => other,
            }
        })?;
        self.accept(response, Flow::Admin)
    }

    /// Persist and publish the session carried by a successful response.
    fn accept(&self, response: AuthResponse, flow: Flow) -> Result<AuthResponse> {
        let profile = match flow {
            Flow::User => response.user.as_ref(),
            Flow::Admin => response.admin.as_ref(),
        };

        let (token, profile) = match (response.token.as_deref(), profile) {
            (Some(token), Some(profile)) if !token.is_empty() => (token, profile.clone()),
            _ => {
                return Err(AuthError::MalformedResponse(
                    "response is missing token or profile".to_string(),
                ))
            }
        };

        self.store.save(token, &profile)?;
        tracing::info!(user_id = %profile.id, role = %profile.role, "Session started");
        self.current_user.send_replace(Some(profile));

        Ok(response)
    }

    // ─── Session teardown ────────────────────────────────────────────────────

    /// Close the session and send the user to the login surface.
    pub fn logout(&self) {
        self.end_session();
        tracing::info!("Session closed");
        self.navigator.navigate(LOGIN_PATH);
    }

    fn end_session(&self) {
        self.store.clear();
        self.current_user.send_replace(None);
    }

    // ─── Profile and token maintenance ───────────────────────────────────────

    /// Refresh the published profile from the API.
    ///
    /// Sent through the interceptor, so an expired token is refreshed and
    /// the request replayed first. A final 401 closes the session before
    /// the error is returned.
    pub async fn fetch_profile(&self) -> Result<ProfileResponse> {
        self.store.token().ok_or(AuthError::NotAuthenticated)?;

        let request = self.api.profile_request()?;
        let result = match AuthInterceptor::new(self.clone()).execute(request).await {
            Ok(response) => check_response_json::<ProfileResponse>(response).await,
            Err(e) => Err(e),
        };

        let profile = match result {
            Ok(profile) => profile,
            Err(e) => {
                // A failed refresh has already closed the session.
                if e.is_unauthorized() && self.store.token().is_some() {
                    tracing::info!("Profile fetch rejected, closing session");
                    self.logout();
                }
                return Err(e);
            }
        };

        let updated = self
            .current_user
            .borrow()
            .as_ref()
            .map(|current| merge_profile(current, &profile));

        if let Some(updated) = updated {
            self.store.save_profile(&updated)?;
            self.current_user.send_replace(Some(updated));
        }

        Ok(profile)
    }

    /// Exchange the stored token for a new one.
    ///
    /// Any failure closes the session before the error is returned.
    pub async fn refresh_token(&self) -> Result<String> {
        match self.try_refresh().await {
            Ok(token) => {
                tracing::info!("Session token refreshed");
                Ok(token)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, closing session");
                self.logout();
                Err(e)
            }
        }
    }

    async fn try_refresh(&self) -> Result<String> {
        let token = self.store.token().ok_or(AuthError::NotAuthenticated)?;
        let response = self.api.refresh_token(&token).await?;

        if response.token.is_empty() {
            return Err(AuthError::MalformedResponse(
                "refresh returned an empty token".to_string(),
            ));
        }

        self.store.save_token(&response.token)?;
        Ok(response.token)
    }

    // ─── Read side ───────────────────────────────────────────────────────────

    /// Receiver of the published current user.
    pub fn subscribe(&self) -> watch::Receiver<Option<UserProfile>> {
        self.current_user.subscribe()
    }

    /// Receiver of the loading flag.
    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::new(self.store.token().is_some(), self.current_user())
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.current_user.borrow().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.store.token()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user.borrow().is_some() && self.store.token().is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.role().is_some_and(Role::is_admin)
    }

    pub fn is_webmaster(&self) -> bool {
        self.role() == Some(Role::Webmaster)
    }

    pub fn is_super_admin(&self) -> bool {
        self.is_webmaster()
    }

    pub fn privileges(&self) -> Option<Privileges> {
        self.current_user
            .borrow()
            .as_ref()
            .and_then(|u| u.privileges.clone())
    }

    pub fn has_privilege(&self, privilege: Privilege) -> bool {
        self.current_user
            .borrow()
            .as_ref()
            .is_some_and(|u| u.has_privilege(privilege))
    }

    fn role(&self) -> Option<Role> {
        self.current_user.borrow().as_ref().map(|u| u.role)
    }

    fn start_loading(&self) -> LoadingGuard<'_> {
        self.loading.send_replace(true);
        LoadingGuard(&self.loading)
    }
}

/// Apply fetched profile fields to the published profile.
///
/// Privileges are only replaced when the API sends them.
fn merge_profile(current: &UserProfile, fetched: &ProfileResponse) -> UserProfile {
    UserProfile {
        id: fetched.id.clone(),
        name: fetched.name.clone(),
        email: fetched.email.clone(),
        role: fetched.role,
        privileges: fetched
            .privileges
            .clone()
            .or_else(|| current.privileges.clone()),
    }
}
