// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DreamWall

//! # Storage Module
//!
//! Persistent storage for DreamWall, rooted at `DATA_DIR` (default `./data`).
//!
//! ## Storage Layout
//!
//! ```text
//! ./data/
//!   users/
//!     {user_id}.json       # Account record (includes the password hash)
//!   walls/
//!     {design_id}.json     # Wall design (layout + share/edit tokens)
//!   billing/
//!     ledger.redb          # Append-only billing ledger
//! ```
//!
//! Accounts and designs are JSON documents written atomically; the billing
//! ledger is an embedded redb database because it is append-only and always
//! read newest-first per user.

pub mod billing_ledger;
pub mod fs;
pub mod paths;
pub mod repository;

pub use billing_ledger::{BillingLedger, BillingRecord, LedgerError, LedgerResult};
pub use fs::{FileStorage, StorageError, StorageResult};
pub use paths::StoragePaths;
pub use repository::{StoredUser, StoredWallDesign, UserRepository, WallRepository};
