// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin-only user management, sent through the session interceptor.

use crate::error::Result;
use crate::models::{CreateAdminResponse, NewAdminUser, UserListResponse, UserListing};
use crate::services::api::{check_response_json, ApiClient};
use crate::services::auth::AuthService;
use crate::services::interceptor::AuthInterceptor;
use validator::Validate;

/// Admin user management.
#[derive(Clone)]
pub struct AdminService {
    api: ApiClient,
    interceptor: AuthInterceptor,
}

impl AdminService {
    pub fn new(auth: &AuthService) -> Self {
        Self::with_interceptor(auth.api().clone(), AuthInterceptor::new(auth.clone()))
    }

    /// Share an interceptor (and its in-flight refresh) with other callers.
    pub fn with_interceptor(api: ApiClient, interceptor: AuthInterceptor) -> Self {
        Self { api, interceptor }
    }

    /// Create an admin or webmaster account.
    pub async fn create_admin_user(&self, data: &NewAdminUser) -> Result<CreateAdminResponse> {
        data.validate()?;

        let request = self
            .api
            .http()
            .post(self.api.url("/admin/users"))
            .json(data)
            .build()?;

        let result = match self.interceptor.execute(request).await {
            Ok(response) => check_response_json::<CreateAdminResponse>(response).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(created) => {
                tracing::info!(
                    user_id = %created.user.id,
                    role = %created.user.role,
                    "Admin user created"
                );
                Ok(created)
            }
            Err(e) => {
                tracing::error!(error = %e, email = %data.email, "Failed to create admin user");
                Err(e)
            }
        }
    }

    /// List registered users.
    pub async fn list_users(&self) -> Result<Vec<UserListing>> {
        let request = self.api.http().get(self.api.url("/admin/users")).build()?;

        let result = match self.interceptor.execute(request).await {
            Ok(response) => check_response_json::<UserListResponse>(response).await,
            Err(e) => Err(e),
        };

        result.map(|list| list.users).inspect_err(|e| {
            tracing::error!(error = %e, "Failed to list users");
        })
    }
}
