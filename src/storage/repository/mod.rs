// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DreamWall

//! Repository layer providing typed access to stored documents.
//!
//! Each repository provides CRUD operations for a specific entity type,
//! using the FileStorage for all file operations.

pub mod users;
pub mod walls;

pub use users::{StoredUser, UserRepository};
pub use walls::{StoredWallDesign, WallRepository};
