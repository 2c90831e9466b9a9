// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use dojo_auth::models::{Role, UserProfile};
use dojo_auth::services::{AdminService, ApiClient, AuthInterceptor, AuthService, Navigator};
use dojo_auth::store::{MemoryStorage, SessionStore};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Password the fake API accepts for every account.
#[allow(dead_code)]
pub const PASSWORD: &str = "secret1";

/// Behaviour and counters of the fake dojo API.
#[derive(Default)]
pub struct FakeApi {
    /// Tokens accepted on protected endpoints
    valid_tokens: Mutex<HashSet<String>>,
    /// Tokens rejected with 403 on protected endpoints
    forbidden_tokens: Mutex<HashSet<String>>,
    /// Token handed out by `/refresh-token`; `None` answers 401
    refresh_to: Mutex<Option<String>>,
    refresh_delay: Mutex<Duration>,
    /// Privileges returned by `/auth/perfil`; `None` omits the field
    profile_privileges: Mutex<Option<Value>>,
    pub login_calls: AtomicUsize,
    pub profile_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub admin_calls: AtomicUsize,
}

#[allow(dead_code)]
impl FakeApi {
    pub fn accept_token(&self, token: &str) {
        self.valid_tokens.lock().unwrap().insert(token.to_string());
    }

    pub fn revoke_token(&self, token: &str) {
        self.valid_tokens.lock().unwrap().remove(token);
    }

    pub fn forbid_token(&self, token: &str) {
        self.forbidden_tokens
            .lock()
            .unwrap()
            .insert(token.to_string());
    }

    /// Make `/refresh-token` succeed with `token` (or fail with 401 on `None`).
    pub fn refresh_with(&self, token: Option<&str>) {
        *self.refresh_to.lock().unwrap() = token.map(str::to_string);
    }

    pub fn delay_refresh(&self, delay: Duration) {
        *self.refresh_delay.lock().unwrap() = delay;
    }

    pub fn profile_privileges(&self, privileges: Option<Value>) {
        *self.profile_privileges.lock().unwrap() = privileges;
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn check_bearer(&self, headers: &HeaderMap) -> Result<String, (StatusCode, Json<Value>)> {
        let token = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_string);

        let Some(token) = token else {
            return Err(unauthorized("Token no proporcionado"));
        };
        if self.forbidden_tokens.lock().unwrap().contains(&token) {
            return Err((
                StatusCode::FORBIDDEN,
                Json(json!({ "mensaje": "Acceso denegado" })),
            ));
        }
        if !self.valid_tokens.lock().unwrap().contains(&token) {
            return Err(unauthorized("Token inválido"));
        }
        Ok(token)
    }
}

type Reply = (StatusCode, Json<Value>);

fn unauthorized(message: &str) -> Reply {
    (StatusCode::UNAUTHORIZED, Json(json!({ "mensaje": message })))
}

fn profile_json(id: &str, email: &str, role: &str) -> Value {
    json!({ "id": id, "nombre": "Morihei", "email": email, "role": role })
}

/// Role of the fake account behind an email address.
fn role_for(email: &str) -> &'static str {
    if email.starts_with("webmaster") {
        "webmaster"
    } else if email.starts_with("admin") {
        "admin"
    } else {
        "user"
    }
}

async fn registro(State(api): State<Arc<FakeApi>>, Json(body): Json<Value>) -> Reply {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    if email.starts_with("taken") {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "mensaje": "El email ya está registrado" })),
        );
    }

    api.accept_token("tok-new");
    (
        StatusCode::CREATED,
        Json(json!({
            "mensaje": "Usuario registrado",
            "token": "tok-new",
            "usuario": profile_json("u-new", &email, "user"),
        })),
    )
}

async fn login(State(api): State<Arc<FakeApi>>, Json(body): Json<Value>) -> Reply {
    api.login_calls.fetch_add(1, Ordering::SeqCst);

    let email = body["email"].as_str().unwrap_or_default();
    if body["password"] != PASSWORD {
        return unauthorized("Credenciales inválidas");
    }
    if email.starts_with("broken") {
        return (StatusCode::OK, Json(json!({ "mensaje": "Login exitoso" })));
    }

    api.accept_token("tok-1");
    (
        StatusCode::OK,
        Json(json!({
            "mensaje": "Login exitoso",
            "token": "tok-1",
            "usuario": profile_json("u1", email, role_for(email)),
        })),
    )
}

async fn admin_login(State(api): State<Arc<FakeApi>>, Json(body): Json<Value>) -> Reply {
    api.login_calls.fetch_add(1, Ordering::SeqCst);

    let email = body["email"].as_str().unwrap_or_default();
    if body["password"] != PASSWORD {
        return unauthorized("bad password");
    }
    let role = role_for(email);
    if role == "user" {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "mensaje": "not an admin" })),
        );
    }

    api.accept_token("tok-admin");
    let mut admin = profile_json("a1", email, role);
    admin["privilegios"] = json!({ "gestionarUsuarios": true, "verReportes": false });
    (
        StatusCode::OK,
        Json(json!({ "mensaje": "Login exitoso", "token": "tok-admin", "admin": admin })),
    )
}

async fn perfil(State(api): State<Arc<FakeApi>>, headers: HeaderMap) -> Reply {
    api.profile_calls.fetch_add(1, Ordering::SeqCst);

    if let Err(reply) = api.check_bearer(&headers) {
        return reply;
    }

    let mut body = json!({
        "_id": "u1",
        "nombre": "Morihei Ueshiba",
        "email": "admin@dojo.example",
        "role": "admin",
    });
    if let Some(privileges) = api.profile_privileges.lock().unwrap().clone() {
        body["privilegios"] = privileges;
    }
    (StatusCode::OK, Json(body))
}

async fn refresh(State(api): State<Arc<FakeApi>>, headers: HeaderMap) -> Reply {
    api.refresh_calls.fetch_add(1, Ordering::SeqCst);

    let delay = *api.refresh_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    if headers.get("authorization").is_none() {
        return unauthorized("Token no proporcionado");
    }

    let next = api.refresh_to.lock().unwrap().clone();
    match next {
        Some(token) => {
            api.accept_token(&token);
            (StatusCode::OK, Json(json!({ "token": token })))
        }
        None => unauthorized("Sesión expirada"),
    }
}

async fn list_users(State(api): State<Arc<FakeApi>>, headers: HeaderMap) -> Reply {
    api.admin_calls.fetch_add(1, Ordering::SeqCst);

    if let Err(reply) = api.check_bearer(&headers) {
        return reply;
    }
    (
        StatusCode::OK,
        Json(json!({
            "usuarios": [
                { "_id": "u1", "nombre": "Ana", "email": "ana@dojo.example", "role": "user" },
                { "_id": "a1", "nombre": "Luis", "email": "admin@dojo.example", "role": "admin",
                  "fechaRegistro": "2026-03-01T09:00:00Z" },
            ]
        })),
    )
}

async fn create_user(
    State(api): State<Arc<FakeApi>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    api.admin_calls.fetch_add(1, Ordering::SeqCst);

    if let Err(reply) = api.check_bearer(&headers) {
        return reply;
    }
    (
        StatusCode::CREATED,
        Json(json!({
            "message": "Usuario creado",
            "usuario": {
                "_id": "a2",
                "nombre": body["nombre"],
                "email": body["email"],
                "role": body["role"],
            }
        })),
    )
}

/// Serve the fake API on an ephemeral port. Returns the API base URL.
pub async fn spawn_api(api: Arc<FakeApi>) -> String {
    let routes = Router::new()
        .route("/registro", post(registro))
        .route("/login", post(login))
        .route("/admin/login", post(admin_login))
        .route("/auth/perfil", get(perfil))
        .route("/refresh-token", post(refresh))
        .route("/admin/users", get(list_users).post(create_user))
        .with_state(api);

    let app = Router::new().nest("/api", routes);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake API");
    let addr = listener.local_addr().expect("No local address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Fake API failed");
    });

    format!("http://{}/api", addr)
}

/// Navigator that records every requested path.
#[derive(Default)]
pub struct RecordingNavigator {
    paths: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl RecordingNavigator {
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        self.paths.lock().unwrap().push(path.to_string());
    }
}

/// Client-side services wired against a fake API.
#[allow(dead_code)]
pub struct TestClient {
    pub api: Arc<FakeApi>,
    pub storage: Arc<MemoryStorage>,
    pub store: SessionStore,
    pub navigator: Arc<RecordingNavigator>,
    pub auth: AuthService,
    pub interceptor: AuthInterceptor,
    pub admin: AdminService,
}

#[allow(dead_code)]
impl TestClient {
    pub async fn new() -> Self {
        let api = Arc::new(FakeApi::default());
        let base_url = spawn_api(api.clone()).await;

        let client = ApiClient::with_client(reqwest::Client::new(), &base_url);
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::new(storage.clone());
        let navigator = Arc::new(RecordingNavigator::default());

        let auth = AuthService::new(client.clone(), store.clone(), navigator.clone());
        let interceptor = AuthInterceptor::new(auth.clone());
        let admin = AdminService::with_interceptor(client, interceptor.clone());

        Self {
            api,
            storage,
            store,
            navigator,
            auth,
            interceptor,
            admin,
        }
    }

    /// Persist a session as if a previous run had signed in.
    pub fn seed_session(&self, token: &str, role: Role) -> UserProfile {
        let profile = UserProfile {
            id: "u1".to_string(),
            name: "Morihei".to_string(),
            email: "admin@dojo.example".to_string(),
            role,
            privileges: None,
        };
        self.store.save(token, &profile).unwrap();
        profile
    }
}
