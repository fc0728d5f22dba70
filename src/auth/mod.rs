// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DreamWall

//! # Authentication Module
//!
//! Session and password handling for the DreamWall API.
//!
//! ## Auth Flow
//!
//! 1. The SPA signs the user up (OTP-gated) or logs them in
//! 2. The server issues an HS256 session token (1 hour lifetime)
//! 3. The SPA sends `Authorization: Bearer <token>` on subsequent requests
//! 4. Handlers use the `Auth` / `AdminOnly` extractors to require a session
//!
//! ## Security
//!
//! - Passwords are PBKDF2-HMAC-SHA256 hashed with per-user salts
//! - Roles are read from the user store, never from the token
//! - Clock skew tolerance is 60 seconds

pub mod claims;
pub mod error;
pub mod extractor;
pub mod password;
pub mod roles;
pub mod token;

pub use claims::AuthenticatedUser;
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth};
pub use password::{hash_password, verify_password};
pub use roles::Role;
pub use token::AuthKeys;
