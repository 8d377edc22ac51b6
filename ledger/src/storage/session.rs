//! # Session
//!
//! A write-buffered view over a [`StateStore`]. Reads see the session's own
//! pending writes first, then the backend. Nothing reaches the backend until
//! [`Session::commit`]; dropping a session discards everything it buffered.
//!
//! This is what makes a contract operation all-or-nothing. The contract
//! mutates through the session as it goes, and the executor only commits
//! once the whole operation has succeeded.

use std::collections::BTreeMap;

use super::{
    decode_record, encode_record, Record, RowKey, StateStore, StoreError, StoreResult, StoredRow,
    WriteBatch,
};
use crate::name::Name;

/// Pending writes over a backend, keyed by row. `None` marks a deletion.
pub struct Session<'s> {
    store: &'s dyn StateStore,
    pending: BTreeMap<RowKey, Option<StoredRow>>,
}

impl<'s> Session<'s> {
    /// Opens an empty session over `store`.
    pub fn new(store: &'s dyn StateStore) -> Self {
        Self {
            store,
            pending: BTreeMap::new(),
        }
    }

    fn row(&self, key: &RowKey) -> StoreResult<Option<StoredRow>> {
        match self.pending.get(key) {
            Some(pending) => Ok(pending.clone()),
            None => self.store.get(key),
        }
    }

    /// Looks up a record by scope and primary key.
    pub fn find<R: Record>(&self, scope: u64, primary: u64) -> StoreResult<Option<R>> {
        let key = RowKey::new(R::TABLE, scope, primary);
        match self.row(&key)? {
            Some(row) => Ok(Some(decode_record(&row.data)?)),
            None => Ok(None),
        }
    }

    /// The account paying for a record's storage, if the record exists.
    pub fn payer_of<R: Record>(&self, scope: u64, primary: u64) -> StoreResult<Option<Name>> {
        let key = RowKey::new(R::TABLE, scope, primary);
        Ok(self.row(&key)?.map(|row| row.payer))
    }

    /// Creates a record charged to `payer`.
    ///
    /// # Errors
    ///
    /// [`StoreError::DuplicateRow`] if a record already sits at that key.
    pub fn insert<R: Record>(&mut self, scope: u64, payer: Name, record: &R) -> StoreResult<()> {
        let key = RowKey::new(R::TABLE, scope, record.primary_key());
        if self.row(&key)?.is_some() {
            return Err(StoreError::DuplicateRow(key));
        }
        let data = encode_record(record)?;
        self.pending.insert(key, Some(StoredRow { payer, data }));
        Ok(())
    }

    /// Overwrites an existing record. The payer is kept unless `payer` says
    /// otherwise.
    ///
    /// # Errors
    ///
    /// [`StoreError::MissingRow`] if there is nothing to update.
    pub fn update<R: Record>(
        &mut self,
        scope: u64,
        record: &R,
        payer: Option<Name>,
    ) -> StoreResult<()> {
        let key = RowKey::new(R::TABLE, scope, record.primary_key());
        let existing = self.row(&key)?.ok_or(StoreError::MissingRow(key))?;
        let data = encode_record(record)?;
        let payer = payer.unwrap_or(existing.payer);
        self.pending.insert(key, Some(StoredRow { payer, data }));
        Ok(())
    }

    /// Removes a record.
    ///
    /// # Errors
    ///
    /// [`StoreError::MissingRow`] if there is nothing to remove.
    pub fn erase<R: Record>(&mut self, scope: u64, primary: u64) -> StoreResult<()> {
        let key = RowKey::new(R::TABLE, scope, primary);
        if self.row(&key)?.is_none() {
            return Err(StoreError::MissingRow(key));
        }
        self.pending.insert(key, None);
        Ok(())
    }

    /// Every record of type `R`, with its scope and payer, as this session
    /// sees them.
    pub fn scan<R: Record>(&self) -> StoreResult<Vec<(u64, Name, R)>> {
        let mut merged: BTreeMap<RowKey, StoredRow> = self.store.scan(R::TABLE)?.into_iter().collect();
        for (key, pending) in self.pending.range(
            RowKey::new(R::TABLE, 0, 0)..=RowKey::new(R::TABLE, u64::MAX, u64::MAX),
        ) {
            match pending {
                Some(row) => {
                    merged.insert(*key, row.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        merged
            .into_iter()
            .map(|(key, row)| Ok((key.scope, row.payer, decode_record(&row.data)?)))
            .collect()
    }

    /// Number of buffered writes.
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    /// Hands every buffered write to the backend as one batch. Returns the
    /// number of rows written or deleted.
    pub fn commit(self) -> StoreResult<usize> {
        let mut batch = WriteBatch::new();
        for (key, row) in self.pending {
            match row {
                Some(row) => batch.put(key, row),
                None => batch.delete(key),
            }
        }
        let writes = batch.len();
        self.store.apply(batch)?;
        Ok(writes)
    }
}
