// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Dojo-Auth: session layer for the dojo website client
//!
//! This crate keeps the signed-in user's token and profile, talks to the
//! dojo REST API, and answers the role and privilege questions that route
//! guards and visibility gates ask.

pub mod config;
pub mod error;
pub mod guards;
pub mod models;
pub mod services;
pub mod store;
pub mod visibility;

use config::Config;
use error::Result;
use services::{AdminService, ApiClient, AuthService, Navigator};
use std::sync::Arc;
use store::{FileStorage, SessionStore};

/// Shared client state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub auth: AuthService,
    pub admin: AdminService,
}

impl AppState {
    /// Wire the services over the configured session file.
    pub fn new(config: Config, navigator: Arc<dyn Navigator>) -> Result<Self> {
        let api = ApiClient::new(&config)?;
        let store = SessionStore::new(Arc::new(FileStorage::new(&config.session_file)));
        let auth = AuthService::new(api, store, navigator);
        let admin = AdminService::new(&auth);

        Ok(Self {
            config,
            auth,
            admin,
        })
    }
}
