// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DreamWall

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    auth::AuthKeys,
    config::Config,
    mailer::Mailer,
    otp::OtpStore,
    storage::{BillingLedger, FileStorage},
};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub storage: FileStorage,
    pub billing: Arc<BillingLedger>,
    pub otp: Arc<RwLock<OtpStore>>,
    pub auth: AuthKeys,
    pub mailer: Arc<Mailer>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        storage: FileStorage,
        billing: BillingLedger,
        auth: AuthKeys,
        mailer: Mailer,
        config: Config,
    ) -> Self {
        Self {
            storage,
            billing: Arc::new(billing),
            otp: Arc::new(RwLock::new(OtpStore::new())),
            auth,
            mailer: Arc::new(mailer),
            config: Arc::new(config),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Shared test fixtures: a fully wired AppState on a temp directory.

    use tempfile::TempDir;

    use super::*;
    use crate::{
        auth::{hash_password, Role},
        storage::{StoragePaths, StoredUser, UserRepository},
    };

    /// Password every seeded test user gets.
    pub const TEST_PASSWORD: &str = "correct horse battery staple";

    /// Build an AppState rooted in a fresh temp directory. Keep the returned
    /// TempDir alive for the duration of the test.
    pub fn state() -> (AppState, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        let mut storage = FileStorage::new(StoragePaths::new(dir.path()));
        storage.initialize().expect("initialize storage");

        let billing =
            BillingLedger::open(&storage.paths().billing_ledger()).expect("open ledger");

        let state = AppState::new(
            storage,
            billing,
            AuthKeys::from_secret(b"test-secret"),
            Mailer::log_only(),
            Config::default(),
        );
        (state, dir)
    }

    /// Create a user with [`TEST_PASSWORD`] and return the stored record.
    pub fn seed_user(state: &AppState, email: &str, role: Role) -> StoredUser {
        let user = StoredUser::new(
            email.split('@').next().unwrap_or("user").to_string(),
            email.to_string(),
            hash_password(TEST_PASSWORD).expect("hash"),
            role,
        );
        UserRepository::new(&state.storage)
            .create(&user)
            .expect("seed user");
        user
    }
}
