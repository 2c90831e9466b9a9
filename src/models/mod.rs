// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the session layer.

pub mod auth;
pub mod user;

pub use auth::{
    AdminLoginCredentials, AuthResponse, CreateAdminResponse, LoginCredentials, NewAdminUser,
    ProfileResponse, RefreshTokenResponse, Registration, UserListResponse, UserListing,
};
pub use user::{Privilege, Privileges, Role, UserProfile};
