// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DreamWall

//! Wall design repository.
//!
//! Each design is one JSON file under `walls/`: the layout itself plus the
//! owner, the public flag, and the share/edit tokens. Tokens are minted at
//! most once per design and reused on every later request, so a link that
//! was handed out keeps working for the life of the design.

use chrono::{DateTime, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::super::{FileStorage, StorageError, StorageResult};
use crate::models::WallLayout;

/// Share/edit tokens are 24 random bytes, hex encoded (48 chars).
const TOKEN_BYTES: usize = 24;

/// Wall design record on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredWallDesign {
    /// Unique design identifier (UUID)
    pub id: String,
    /// Owner user ID
    pub user_id: String,
    /// Display name
    pub wall_name: String,
    /// The layout payload
    pub wall_data: WallLayout,
    /// Whether the design shows up as public
    #[serde(default)]
    pub public: bool,
    /// Read-only share token, minted on first share
    #[serde(default)]
    pub share_token: Option<String>,
    /// Edit token, minted on first edit-share
    #[serde(default)]
    pub edit_token: Option<String>,
    /// When the design was created
    pub created_at: DateTime<Utc>,
    /// When the design was last updated
    pub updated_at: DateTime<Utc>,
}

impl StoredWallDesign {
    /// Build a fresh design record owned by `user_id`.
    pub fn new(user_id: String, wall_name: String, wall_data: WallLayout) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            wall_name,
            wall_data,
            public: false,
            share_token: None,
            edit_token: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Repository for wall design records.
pub struct WallRepository<'a> {
    storage: &'a FileStorage,
}

impl<'a> WallRepository<'a> {
    pub fn new(storage: &'a FileStorage) -> Self {
        Self { storage }
    }

    /// Check if a design exists.
    pub fn exists(&self, design_id: &str) -> bool {
        self.storage.exists(self.storage.paths().wall(design_id))
    }

    /// Get a design by ID.
    pub fn get(&self, design_id: &str) -> StorageResult<StoredWallDesign> {
        let path = self.storage.paths().wall(design_id);
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("Wall design {design_id}")));
        }
        self.storage.read_json(path)
    }

    /// Create a new design.
    pub fn create(&self, design: &StoredWallDesign) -> StorageResult<()> {
        if self.exists(&design.id) {
            return Err(StorageError::AlreadyExists(format!(
                "Wall design {}",
                design.id
            )));
        }

        self.storage
            .write_json(self.storage.paths().wall(&design.id), design)
    }

    /// Update an existing design.
    pub fn update(&self, design: &StoredWallDesign) -> StorageResult<()> {
        if !self.exists(&design.id) {
            return Err(StorageError::NotFound(format!(
                "Wall design {}",
                design.id
            )));
        }

        self.storage
            .write_json(self.storage.paths().wall(&design.id), design)
    }

    /// Delete a design.
    pub fn delete(&self, design_id: &str) -> StorageResult<()> {
        if !self.exists(design_id) {
            return Err(StorageError::NotFound(format!("Wall design {design_id}")));
        }

        self.storage.delete(self.storage.paths().wall(design_id))
    }

    /// List every design, newest first.
    pub fn list_all(&self) -> StorageResult<Vec<StoredWallDesign>> {
        let ids = self
            .storage
            .list_files(self.storage.paths().walls_dir(), "json")?;

        let mut designs = Vec::new();
        for id in ids {
            if let Ok(design) = self.get(&id) {
                designs.push(design);
            }
        }
        designs.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(designs)
    }

    /// List a user's designs, newest first.
    pub fn list_by_user(&self, user_id: &str) -> StorageResult<Vec<StoredWallDesign>> {
        let mut designs = self.list_all()?;
        designs.retain(|design| design.user_id == user_id);
        Ok(designs)
    }

    /// Look up a design by its share token.
    pub fn get_by_share_token(&self, token: &str) -> StorageResult<StoredWallDesign> {
        self.find(|design| design.share_token.as_deref() == Some(token))
    }

    /// Look up a design by its edit token.
    pub fn get_by_edit_token(&self, token: &str) -> StorageResult<StoredWallDesign> {
        self.find(|design| design.edit_token.as_deref() == Some(token))
    }

    /// Return the design's share token, minting and persisting one the
    /// first time it is requested.
    pub fn ensure_share_token(&self, design_id: &str) -> StorageResult<String> {
        let mut design = self.get(design_id)?;
        if let Some(token) = design.share_token {
            return Ok(token);
        }

        let token = generate_token()?;
        design.share_token = Some(token.clone());
        self.update(&design)?;
        Ok(token)
    }

    /// Return the design's edit token, minting and persisting one the
    /// first time it is requested.
    pub fn ensure_edit_token(&self, design_id: &str) -> StorageResult<String> {
        let mut design = self.get(design_id)?;
        if let Some(token) = design.edit_token {
            return Ok(token);
        }

        let token = generate_token()?;
        design.edit_token = Some(token.clone());
        self.update(&design)?;
        Ok(token)
    }

    /// Delete every design owned by a user. Returns how many were removed.
    pub fn delete_by_user(&self, user_id: &str) -> StorageResult<usize> {
        let designs = self.list_by_user(user_id)?;
        let count = designs.len();
        for design in designs {
            self.delete(&design.id)?;
        }
        Ok(count)
    }

    fn find(
        &self,
        predicate: impl Fn(&StoredWallDesign) -> bool,
    ) -> StorageResult<StoredWallDesign> {
        let ids = self
            .storage
            .list_files(self.storage.paths().walls_dir(), "json")?;

        for id in ids {
            if let Ok(design) = self.get(&id) {
                if predicate(&design) {
                    return Ok(design);
                }
            }
        }

        Err(StorageError::NotFound("Wall design".to_string()))
    }
}

/// Generate a share/edit token: 24 random bytes as lowercase hex.
fn generate_token() -> StorageResult<String> {
    let rng = SystemRandom::new();
    let mut bytes = [0u8; TOKEN_BYTES];
    rng.fill(&mut bytes).map_err(|_| StorageError::Rng)?;

    let mut token = String::with_capacity(TOKEN_BYTES * 2);
    for byte in bytes {
        token.push_str(&format!("{byte:02x}"));
    }
    Ok(token)
}
