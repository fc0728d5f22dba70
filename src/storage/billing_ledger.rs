// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DreamWall

//! Append-only billing ledger backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `billing_records`: record_id → serialized BillingRecord
//! - `user_billing_index`: composite key (user_id|!timestamp|record_id) → record_id

use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: record_id → serialized BillingRecord (JSON bytes).
const RECORDS: TableDefinition<&str, &[u8]> = TableDefinition::new("billing_records");

/// Index: composite key → record_id.
/// Key format: `user_id|!timestamp_be|record_id` for descending-time range scans.
const USER_INDEX: TableDefinition<&[u8], &str> = TableDefinition::new("user_billing_index");

// =============================================================================
// Record Type
// =============================================================================

/// One billing event. Records are never mutated after being written.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct BillingRecord {
    /// Unique record identifier (UUID)
    pub id: String,
    /// The billed user
    pub user_id: String,
    /// Plan name at the time of billing
    pub plan: String,
    /// Amount charged
    pub amount: f64,
    /// Subscription period start
    pub start_date: DateTime<Utc>,
    /// Subscription period end
    pub end_date: Option<DateTime<Utc>>,
    /// When the record was written
    pub created_at: DateTime<Utc>,
}

impl BillingRecord {
    pub fn new(
        user_id: String,
        plan: String,
        amount: f64,
        start_date: DateTime<Utc>,
        end_date: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            plan,
            amount,
            start_date,
            end_date,
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Build a composite key for the user index.
///
/// Format: `user_id | inverted_timestamp_be_bytes | record_id`
///
/// The inverted timestamp ensures newest-first ordering when scanning forward.
fn make_index_key(user_id: &str, timestamp: i64, record_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(user_id.len() + 1 + 8 + 1 + record_id.len());
    key.extend_from_slice(user_id.as_bytes());
    key.push(b'|');
    key.extend_from_slice(&(!timestamp as u64).to_be_bytes());
    key.push(b'|');
    key.extend_from_slice(record_id.as_bytes());
    key
}

/// Build a prefix key for range scanning all records of a user.
fn make_prefix(user_id: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(user_id.len() + 1);
    prefix.extend_from_slice(user_id.as_bytes());
    prefix.push(b'|');
    prefix
}

/// Build the upper bound for a range scan (prefix with 0xFF bytes appended).
fn make_prefix_end(user_id: &str) -> Vec<u8> {
    let mut end = make_prefix(user_id);
    end.extend_from_slice(&[0xFF; 20]);
    end
}

/// Extract the record_id from a composite index key.
fn extract_record_id(key: &[u8]) -> Option<&str> {
    // user_id | ts(8 bytes) | record_id: the record id follows the last '|'
    let pos = key.iter().rposition(|&b| b == b'|')?;
    std::str::from_utf8(&key[pos + 1..]).ok()
}

// =============================================================================
// BillingLedger
// =============================================================================

/// Embedded ACID billing ledger.
pub struct BillingLedger {
    db: Database,
}

impl BillingLedger {
    /// Open (or create) the ledger at the given path.
    pub fn open(path: &Path) -> LedgerResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(RECORDS)?;
            let _ = write_txn.open_table(USER_INDEX)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Append a billing record and its index entry.
    pub fn append(&self, record: &BillingRecord) -> LedgerResult<()> {
        let json = serde_json::to_vec(record)?;
        let timestamp = record.created_at.timestamp();

        let write_txn = self.db.begin_write()?;
        {
            let mut records = write_txn.open_table(RECORDS)?;
            records.insert(record.id.as_str(), json.as_slice())?;

            let mut index = write_txn.open_table(USER_INDEX)?;
            let key = make_index_key(&record.user_id, timestamp, &record.id);
            index.insert(key.as_slice(), record.id.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// List a user's billing records, newest first.
    pub fn list_by_user(&self, user_id: &str) -> LedgerResult<Vec<BillingRecord>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(USER_INDEX)?;
        let records = read_txn.open_table(RECORDS)?;

        let prefix = make_prefix(user_id);
        let prefix_end = make_prefix_end(user_id);

        let mut results = Vec::new();
        for entry in index.range(prefix.as_slice()..prefix_end.as_slice())? {
            let entry = entry?;
            let record_id = entry.1.value().to_string();
            if let Some(value) = records.get(record_id.as_str())? {
                let record: BillingRecord = serde_json::from_slice(value.value())?;
                results.push(record);
            }
        }

        Ok(results)
    }

    /// List every billing record, newest first (admin view).
    pub fn list_all(&self) -> LedgerResult<Vec<BillingRecord>> {
        let read_txn = self.db.begin_read()?;
        let records = read_txn.open_table(RECORDS)?;

        let mut results = Vec::new();
        for entry in records.iter()? {
            let entry = entry?;
            let record: BillingRecord = serde_json::from_slice(entry.1.value())?;
            results.push(record);
        }
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(results)
    }

    /// Remove all of a user's records (account deletion cascade).
    /// Returns how many records were removed.
    pub fn delete_by_user(&self, user_id: &str) -> LedgerResult<usize> {
        let prefix = make_prefix(user_id);
        let prefix_end = make_prefix_end(user_id);

        // Collect keys under a read transaction first; redb write tables
        // cannot be iterated and mutated at the same time.
        let mut index_keys: Vec<Vec<u8>> = Vec::new();
        {
            let read_txn = self.db.begin_read()?;
            let index = read_txn.open_table(USER_INDEX)?;
            for entry in index.range(prefix.as_slice()..prefix_end.as_slice())? {
                index_keys.push(entry?.0.value().to_vec());
            }
        }

        let write_txn = self.db.begin_write()?;
        {
            let mut records = write_txn.open_table(RECORDS)?;
            let mut index = write_txn.open_table(USER_INDEX)?;
            for key in &index_keys {
                if let Some(record_id) = extract_record_id(key) {
                    records.remove(record_id)?;
                }
                index.remove(key.as_slice())?;
            }
        }
        write_txn.commit()?;

        Ok(index_keys.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_ledger() -> (BillingLedger, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        let ledger = BillingLedger::open(&dir.path().join("ledger.redb")).expect("open");
        (ledger, dir)
    }

    fn record_at(user_id: &str, plan: &str, created_at: DateTime<Utc>) -> BillingRecord {
        let mut record = BillingRecord::new(
            user_id.to_string(),
            plan.to_string(),
            99.0,
            created_at,
            Some(created_at + chrono::Duration::days(30)),
        );
        record.created_at = created_at;
        record
    }

    #[test]
    fn append_and_list_by_user() {
        let (ledger, _dir) = test_ledger();
        let now = Utc::now();

        ledger.append(&record_at("u1", "basic", now - chrono::Duration::days(2))).unwrap();
        ledger.append(&record_at("u1", "silver", now - chrono::Duration::days(1))).unwrap();
        ledger.append(&record_at("u2", "gold", now)).unwrap();

        let history = ledger.list_by_user("u1").unwrap();
        assert_eq!(history.len(), 2);
        // Newest first
        assert_eq!(history[0].plan, "silver");
        assert_eq!(history[1].plan, "basic");

        assert_eq!(ledger.list_by_user("u2").unwrap().len(), 1);
        assert!(ledger.list_by_user("nobody").unwrap().is_empty());
    }

    #[test]
    fn list_all_is_newest_first() {
        let (ledger, _dir) = test_ledger();
        let now = Utc::now();

        ledger.append(&record_at("u1", "basic", now - chrono::Duration::days(3))).unwrap();
        ledger.append(&record_at("u2", "gold", now)).unwrap();
        ledger.append(&record_at("u3", "free", now - chrono::Duration::days(1))).unwrap();

        let all = ledger.list_all().unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].plan, "gold");
        assert_eq!(all[2].plan, "basic");
    }

    #[test]
    fn delete_by_user_removes_only_their_records() {
        let (ledger, _dir) = test_ledger();
        let now = Utc::now();

        ledger.append(&record_at("u1", "basic", now - chrono::Duration::days(1))).unwrap();
        ledger.append(&record_at("u1", "silver", now)).unwrap();
        ledger.append(&record_at("u2", "gold", now)).unwrap();

        assert_eq!(ledger.delete_by_user("u1").unwrap(), 2);
        assert!(ledger.list_by_user("u1").unwrap().is_empty());
        assert_eq!(ledger.list_by_user("u2").unwrap().len(), 1);
        assert_eq!(ledger.list_all().unwrap().len(), 1);
    }

    #[test]
    fn ledger_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.redb");

        {
            let ledger = BillingLedger::open(&path).unwrap();
            ledger.append(&record_at("u1", "basic", Utc::now())).unwrap();
        }

        let reopened = BillingLedger::open(&path).unwrap();
        assert_eq!(reopened.list_by_user("u1").unwrap().len(), 1);
    }
}
