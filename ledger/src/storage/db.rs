//! # SledStore: Persistent Backend
//!
//! The on-disk backend, built on sled's embedded key-value store.
//!
//! ## Tree Layout
//!
//! | Tree   | Key                                   | Value               |
//! |--------|---------------------------------------|---------------------|
//! | `rows` | `table ‖ scope ‖ primary` (24B BE)    | `bincode(StoredRow)`|
//!
//! Every ledger table shares the one `rows` tree. That is deliberate: sled
//! batches are atomic per tree, so keeping all tables in one tree is what
//! lets a single operation update a supply record and two balance records
//! in one atomic write.

use sled::{Batch, Db, Tree};
use std::path::Path;

use super::{RowKey, StateStore, StoreError, StoreResult, StoredRow, WriteBatch};
use crate::name::Name;

/// Persistent row storage on sled.
///
/// sled is thread-safe; share a `SledStore` via `Arc` without extra locking.
#[derive(Debug, Clone)]
pub struct SledStore {
    db: Db,
    rows: Tree,
}

impl SledStore {
    /// Open or create a database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// A database that lives in a temporary location and is removed on drop.
    pub fn open_temporary() -> StoreResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> StoreResult<Self> {
        let rows = db.open_tree("rows")?;
        Ok(Self { db, rows })
    }

    /// Number of stored rows across all tables.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Blocks until all writes are durable.
    pub fn flush(&self) -> StoreResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

fn encode_row(row: &StoredRow) -> StoreResult<Vec<u8>> {
    bincode::serialize(row).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn decode_row(bytes: &[u8]) -> StoreResult<StoredRow> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

impl StateStore for SledStore {
    fn get(&self, key: &RowKey) -> StoreResult<Option<StoredRow>> {
        match self.rows.get(key.to_bytes())? {
            Some(bytes) => Ok(Some(decode_row(&bytes)?)),
            None => Ok(None),
        }
    }

    fn apply(&self, batch: WriteBatch) -> StoreResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let writes = batch.len();
        let mut sled_batch = Batch::default();
        for (key, row) in batch {
            match row {
                Some(row) => sled_batch.insert(&key.to_bytes(), encode_row(&row)?),
                None => sled_batch.remove(&key.to_bytes()),
            }
        }
        self.rows.apply_batch(sled_batch)?;
        self.db.flush()?;
        tracing::debug!(writes, "batch persisted");
        Ok(())
    }

    fn scan(&self, table: Name) -> StoreResult<Vec<(RowKey, StoredRow)>> {
        let mut out = Vec::new();
        for entry in self.rows.scan_prefix(table.raw().to_be_bytes()) {
            let (key, value) = entry?;
            out.push((RowKey::from_bytes(&key)?, decode_row(&value)?));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(payer: &str, data: &[u8]) -> StoredRow {
        StoredRow {
            payer: Name::new(payer).unwrap(),
            data: data.to_vec(),
        }
    }

    #[test]
    fn open_temporary_database() {
        let store = SledStore::open_temporary().expect("should create temp db");
        assert_eq!(store.row_count(), 0);
    }

    #[test]
    fn rows_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let key = RowKey::new(Name::constant("stat"), 5, 5);
        {
            let store = SledStore::open(dir.path()).expect("open");
            let mut batch = WriteBatch::new();
            batch.put(key, row("tally.token", b"supply"));
            store.apply(batch).unwrap();
        }

        let store = SledStore::open(dir.path()).expect("reopen");
        assert_eq!(store.get(&key).unwrap(), Some(row("tally.token", b"supply")));
    }

    #[test]
    fn batch_applies_puts_and_deletes() {
        let store = SledStore::open_temporary().unwrap();
        let table = Name::constant("accounts");
        let a = RowKey::new(table, 1, 9);
        let b = RowKey::new(table, 2, 9);

        let mut batch = WriteBatch::new();
        batch.put(a, row("alice", b"a"));
        batch.put(b, row("bob", b"b"));
        store.apply(batch).unwrap();
        assert_eq!(store.row_count(), 2);

        let mut batch = WriteBatch::new();
        batch.delete(a);
        store.apply(batch).unwrap();
        assert_eq!(store.get(&a).unwrap(), None);
        assert!(store.get(&b).unwrap().is_some());
    }

    #[test]
    fn scan_returns_only_requested_table_in_key_order() {
        let store = SledStore::open_temporary().unwrap();
        let accounts = Name::constant("accounts");
        let locker = Name::constant("locker");

        let mut batch = WriteBatch::new();
        batch.put(RowKey::new(locker, 1, 1), row("alice", b"l"));
        batch.put(RowKey::new(accounts, 3, 1), row("carol", b"c"));
        batch.put(RowKey::new(accounts, 1, 1), row("alice", b"a"));
        store.apply(batch).unwrap();

        let rows = store.scan(accounts).unwrap();
        let scopes: Vec<u64> = rows.iter().map(|(k, _)| k.scope).collect();
        assert_eq!(scopes, vec![1, 3]);
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let store = SledStore::open_temporary().unwrap();
        store.apply(WriteBatch::new()).unwrap();
        assert_eq!(store.row_count(), 0);
        store.flush().unwrap();
    }
}
