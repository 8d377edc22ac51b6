//! In-memory backend. Everything vanishes on drop, which is exactly what
//! unit tests and short-lived simulations want.

use parking_lot::RwLock;
use std::collections::BTreeMap;

use super::{RowKey, StateStore, StoreResult, StoredRow, WriteBatch};
use crate::name::Name;

/// A `BTreeMap` of rows behind a `RwLock`.
///
/// Batches are applied under a single write guard, so readers never see a
/// half-applied batch.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RwLock<BTreeMap<RowKey, StoredRow>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of rows across all tables.
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// `true` if no rows are stored.
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &RowKey) -> StoreResult<Option<StoredRow>> {
        Ok(self.rows.read().get(key).cloned())
    }

    fn apply(&self, batch: WriteBatch) -> StoreResult<()> {
        let mut rows = self.rows.write();
        for (key, row) in batch {
            match row {
                Some(row) => {
                    rows.insert(key, row);
                }
                None => {
                    rows.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn scan(&self, table: Name) -> StoreResult<Vec<(RowKey, StoredRow)>> {
        let start = RowKey::new(table, 0, 0);
        let end = RowKey::new(table, u64::MAX, u64::MAX);
        Ok(self
            .rows
            .read()
            .range(start..=end)
            .map(|(k, v)| (*k, v.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(payer: &str, byte: u8) -> StoredRow {
        StoredRow {
            payer: Name::new(payer).unwrap(),
            data: vec![byte],
        }
    }

    #[test]
    fn apply_put_then_delete() {
        let store = MemoryStore::new();
        let key = RowKey::new(Name::constant("accounts"), 7, 9);

        let mut batch = WriteBatch::new();
        batch.put(key, row("alice", 1));
        store.apply(batch).unwrap();
        assert_eq!(store.get(&key).unwrap(), Some(row("alice", 1)));

        let mut batch = WriteBatch::new();
        batch.delete(key);
        store.apply(batch).unwrap();
        assert_eq!(store.get(&key).unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn scan_is_limited_to_one_table() {
        let store = MemoryStore::new();
        let accounts = Name::constant("accounts");
        let stat = Name::constant("stat");

        let mut batch = WriteBatch::new();
        batch.put(RowKey::new(accounts, 2, 1), row("bob", 2));
        batch.put(RowKey::new(accounts, 1, 1), row("alice", 1));
        batch.put(RowKey::new(stat, 1, 1), row("tally.token", 3));
        store.apply(batch).unwrap();

        let rows = store.scan(accounts).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0.scope, 1);
        assert_eq!(rows[1].0.scope, 2);
        assert_eq!(store.len(), 3);
    }
}
