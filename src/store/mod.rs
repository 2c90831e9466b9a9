// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session persistence layer (durable key-value storage).

pub mod session;
pub mod storage;

pub use session::SessionStore;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};

/// Storage keys as constants.
pub mod keys {
    /// Opaque bearer token
    pub const TOKEN: &str = "auth_token";
    /// JSON-serialized user profile
    pub const USER: &str = "user_data";
}
