// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - session and API layer.

pub mod admin;
pub mod api;
pub mod auth;
pub mod interceptor;

pub use admin::AdminService;
pub use api::ApiClient;
pub use auth::{AuthService, Navigator, NoopNavigator, SessionSnapshot, LOGIN_PATH};
pub use interceptor::AuthInterceptor;
