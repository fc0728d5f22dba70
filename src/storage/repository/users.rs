// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DreamWall

//! User repository.
//!
//! Each account is stored as a separate JSON file under `users/`. The stored
//! record includes the password hash and is never serialized into an API
//! response directly; handlers convert to [`crate::models::PublicUser`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::super::{FileStorage, StorageError, StorageResult};
use crate::auth::Role;

/// Account record on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredUser {
    /// Unique user identifier (UUID)
    pub id: String,
    /// Display name
    pub username: String,
    /// Login email (unique across accounts)
    pub email: String,
    /// PBKDF2 password hash (see `auth::password`)
    pub password_hash: String,
    /// Authorization role
    #[serde(default)]
    pub role: Role,
    /// Profile photo (data URL or asset path)
    #[serde(default)]
    pub profile_photo: Option<String>,
    /// Whether the account receives notification emails
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
    /// Whether the wall history is publicly visible
    #[serde(default)]
    pub profile_public: bool,
    /// Current subscription plan name (`none` after unsubscribing)
    #[serde(default)]
    pub subscription_plan: Option<String>,
    /// When the current subscription started
    #[serde(default)]
    pub subscription_start: Option<DateTime<Utc>>,
    /// When the current subscription lapses
    #[serde(default)]
    pub subscription_end: Option<DateTime<Utc>>,
    /// When the account was created
    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl StoredUser {
    /// Build a fresh account record with default preferences.
    pub fn new(username: String, email: String, password_hash: String, role: Role) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username,
            email,
            password_hash,
            role,
            profile_photo: None,
            notifications_enabled: true,
            profile_public: false,
            subscription_plan: None,
            subscription_start: None,
            subscription_end: None,
            created_at: Utc::now(),
        }
    }
}

/// Repository for account records.
pub struct UserRepository<'a> {
    storage: &'a FileStorage,
}

impl<'a> UserRepository<'a> {
    pub fn new(storage: &'a FileStorage) -> Self {
        Self { storage }
    }

    /// Check if a user exists.
    pub fn exists(&self, user_id: &str) -> bool {
        self.storage.exists(self.storage.paths().user(user_id))
    }

    /// Get a user by ID.
    pub fn get(&self, user_id: &str) -> StorageResult<StoredUser> {
        let path = self.storage.paths().user(user_id);
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("User {user_id}")));
        }
        self.storage.read_json(path)
    }

    /// Look up a user by login email.
    pub fn get_by_email(&self, email: &str) -> StorageResult<Option<StoredUser>> {
        for id in self.storage.list_files(self.storage.paths().users_dir(), "json")? {
            if let Ok(user) = self.get(&id) {
                if user.email == email {
                    return Ok(Some(user));
                }
            }
        }
        Ok(None)
    }

    /// Create a new user.
    ///
    /// Fails when the ID or the email is already taken.
    pub fn create(&self, user: &StoredUser) -> StorageResult<()> {
        if self.exists(&user.id) {
            return Err(StorageError::AlreadyExists(format!("User {}", user.id)));
        }
        if self.get_by_email(&user.email)?.is_some() {
            return Err(StorageError::AlreadyExists(format!(
                "Account for {}",
                user.email
            )));
        }

        self.storage
            .write_json(self.storage.paths().user(&user.id), user)
    }

    /// Update an existing user.
    pub fn update(&self, user: &StoredUser) -> StorageResult<()> {
        if !self.exists(&user.id) {
            return Err(StorageError::NotFound(format!("User {}", user.id)));
        }

        self.storage
            .write_json(self.storage.paths().user(&user.id), user)
    }

    /// Delete a user record. Cascading deletes (designs, billing) are the
    /// caller's responsibility.
    pub fn delete(&self, user_id: &str) -> StorageResult<()> {
        if !self.exists(user_id) {
            return Err(StorageError::NotFound(format!("User {user_id}")));
        }

        self.storage.delete(self.storage.paths().user(user_id))
    }

    /// List all users, newest first.
    pub fn list_all(&self) -> StorageResult<Vec<StoredUser>> {
        let ids = self
            .storage
            .list_files(self.storage.paths().users_dir(), "json")?;

        let mut users = Vec::new();
        for id in ids {
            if let Ok(user) = self.get(&id) {
                users.push(user);
            }
        }
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoragePaths;
    use tempfile::TempDir;

    fn test_storage() -> (FileStorage, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        let mut storage = FileStorage::new(StoragePaths::new(dir.path()));
        storage.initialize().expect("initialize");
        (storage, dir)
    }

    fn test_user(email: &str) -> StoredUser {
        StoredUser::new(
            "someone".to_string(),
            email.to_string(),
            "pbkdf2-sha256$1$AA$AA".to_string(),
            Role::User,
        )
    }

    #[test]
    fn create_and_get_user() {
        let (storage, _dir) = test_storage();
        let repo = UserRepository::new(&storage);

        let user = test_user("a@example.com");
        repo.create(&user).unwrap();

        let loaded = repo.get(&user.id).unwrap();
        assert_eq!(loaded, user);
        assert!(loaded.notifications_enabled);
        assert!(!loaded.profile_public);
    }

    #[test]
    fn create_rejects_duplicate_email() {
        let (storage, _dir) = test_storage();
        let repo = UserRepository::new(&storage);

        repo.create(&test_user("dup@example.com")).unwrap();
        let err = repo.create(&test_user("dup@example.com")).unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));
    }

    #[test]
    fn get_by_email_finds_the_right_account() {
        let (storage, _dir) = test_storage();
        let repo = UserRepository::new(&storage);

        let a = test_user("a@example.com");
        let b = test_user("b@example.com");
        repo.create(&a).unwrap();
        repo.create(&b).unwrap();

        let found = repo.get_by_email("b@example.com").unwrap().unwrap();
        assert_eq!(found.id, b.id);
        assert!(repo.get_by_email("nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn update_changes_fields() {
        let (storage, _dir) = test_storage();
        let repo = UserRepository::new(&storage);

        let mut user = test_user("edit@example.com");
        repo.create(&user).unwrap();

        user.username = "renamed".to_string();
        user.role = Role::Admin;
        user.profile_public = true;
        repo.update(&user).unwrap();

        let loaded = repo.get(&user.id).unwrap();
        assert_eq!(loaded.username, "renamed");
        assert_eq!(loaded.role, Role::Admin);
        assert!(loaded.profile_public);
    }

    #[test]
    fn delete_missing_user_errors() {
        let (storage, _dir) = test_storage();
        let repo = UserRepository::new(&storage);
        let err = repo.delete("missing").unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn list_all_is_newest_first() {
        let (storage, _dir) = test_storage();
        let repo = UserRepository::new(&storage);

        let mut older = test_user("old@example.com");
        older.created_at = Utc::now() - chrono::Duration::hours(2);
        let newer = test_user("new@example.com");
        repo.create(&older).unwrap();
        repo.create(&newer).unwrap();

        let all = repo.list_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].email, "new@example.com");
        assert_eq!(all[1].email, "old@example.com");
    }
}
