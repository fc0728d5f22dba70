// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DreamWall

//! Path constants and utilities for the storage layout.

use std::path::{Path, PathBuf};

/// Default root for persistent storage when `DATA_DIR` is unset.
pub const DATA_ROOT: &str = "./data";

/// Storage path utilities.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all persistent data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========== User Paths ==========

    /// Directory containing all user records.
    pub fn users_dir(&self) -> PathBuf {
        self.root.join("users")
    }

    /// Path to a specific user record.
    pub fn user(&self, user_id: &str) -> PathBuf {
        self.users_dir().join(format!("{user_id}.json"))
    }

    // ========== Wall Design Paths ==========

    /// Directory containing all wall designs.
    pub fn walls_dir(&self) -> PathBuf {
        self.root.join("walls")
    }

    /// Path to a specific wall design.
    pub fn wall(&self, design_id: &str) -> PathBuf {
        self.walls_dir().join(format!("{design_id}.json"))
    }

    // ========== Billing Paths ==========

    /// Directory containing billing data.
    pub fn billing_dir(&self) -> PathBuf {
        self.root.join("billing")
    }

    /// Path to the billing ledger database file.
    pub fn billing_ledger(&self) -> PathBuf {
        self.billing_dir().join("ledger.redb")
    }
}
