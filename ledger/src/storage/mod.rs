//! # Storage Module
//!
//! Keyed-record tables for the ledger. Every record lives at a
//! [`RowKey`], a `(table, scope, primary)` triple, and carries the name of the
//! account that pays for its storage.
//!
//! ## Architecture
//!
//! ```text
//! session.rs: write-buffered view over a backend; commit or drop
//! memory.rs : MemoryStore: BTreeMap behind a RwLock
//! db.rs     : SledStore: one sled tree, 24-byte big-endian keys
//! ```
//!
//! ## Data Flow
//!
//! ```text
//! contract ── find/insert/update/erase ──▶ Session ── commit ──▶ StateStore
//!                                           (buffer)            (atomic batch)
//! ```
//!
//! ## Design Decisions
//!
//! 1. **One batch per operation.** A session collects every mutation an
//!    operation makes and hands them to the backend as one [`WriteBatch`].
//!    A failed operation simply drops its session.
//!
//! 2. **Bincode for row payloads.** Compact and deterministic. JSON is for
//!    the API.
//!
//! 3. **Big-endian keys.** Table, scope, and primary key are each written as
//!    8 big-endian bytes so byte order equals numeric order, and a table
//!    scan is a prefix scan.

pub mod db;
pub mod memory;
pub mod session;

pub use db::SledStore;
pub use memory::MemoryStore;
pub use session::Session;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::name::Name;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors raised by storage backends and sessions.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("row already exists: {0}")]
    DuplicateRow(RowKey),

    #[error("row not found: {0}")]
    MissingRow(RowKey),

    #[error("corrupt row key: {0} bytes")]
    CorruptKey(usize),
}

pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Keys & Rows
// ---------------------------------------------------------------------------

/// Address of one record.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RowKey {
    /// Table the record belongs to.
    pub table: Name,
    /// Partition inside the table (an account, or a symbol code).
    pub scope: u64,
    /// Primary key inside the scope.
    pub primary: u64,
}

/// Encoded length of a [`RowKey`].
pub const ROW_KEY_LEN: usize = 24;

impl RowKey {
    /// Builds a key.
    pub fn new(table: Name, scope: u64, primary: u64) -> Self {
        Self {
            table,
            scope,
            primary,
        }
    }

    /// Big-endian `table || scope || primary`.
    pub fn to_bytes(&self) -> [u8; ROW_KEY_LEN] {
        let mut out = [0u8; ROW_KEY_LEN];
        out[..8].copy_from_slice(&self.table.raw().to_be_bytes());
        out[8..16].copy_from_slice(&self.scope.to_be_bytes());
        out[16..].copy_from_slice(&self.primary.to_be_bytes());
        out
    }

    /// Inverse of [`RowKey::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> StoreResult<Self> {
        if bytes.len() != ROW_KEY_LEN {
            return Err(StoreError::CorruptKey(bytes.len()));
        }
        let word = |range: std::ops::Range<usize>| {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(&bytes[range]);
            u64::from_be_bytes(buf)
        };
        Ok(Self {
            table: Name::from_raw(word(0..8)),
            scope: word(8..16),
            primary: word(16..24),
        })
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:#x}/{:#x}", self.table, self.scope, self.primary)
    }
}

impl fmt::Debug for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RowKey({})", self)
    }
}

/// A stored record: who pays for it, and its encoded payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRow {
    /// Account charged for this row's storage.
    pub payer: Name,
    /// Bincode-encoded record.
    pub data: Vec<u8>,
}

/// A type that can live in a table.
pub trait Record: Serialize + DeserializeOwned {
    /// Table this record type is stored in.
    const TABLE: Name;

    /// Primary key within a scope.
    fn primary_key(&self) -> u64;
}

pub(crate) fn encode_record<R: Record>(record: &R) -> StoreResult<Vec<u8>> {
    bincode::serialize(record).map_err(|e| StoreError::Serialization(e.to_string()))
}

pub(crate) fn decode_record<R: Record>(bytes: &[u8]) -> StoreResult<R> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// A set of row writes applied together. `None` deletes the row.
#[derive(Debug, Default, Clone)]
pub struct WriteBatch {
    ops: Vec<(RowKey, Option<StoredRow>)>,
}

impl WriteBatch {
    /// An empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes `row` at `key`.
    pub fn put(&mut self, key: RowKey, row: StoredRow) {
        self.ops.push((key, Some(row)));
    }

    /// Deletes the row at `key`.
    pub fn delete(&mut self, key: RowKey) {
        self.ops.push((key, None));
    }

    /// Number of writes.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// `true` if the batch writes nothing.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// The writes, in insertion order.
    pub fn ops(&self) -> &[(RowKey, Option<StoredRow>)] {
        &self.ops
    }
}

impl IntoIterator for WriteBatch {
    type Item = (RowKey, Option<StoredRow>);
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

/// A persistent keyed-row backend.
///
/// Implementations must apply a [`WriteBatch`] atomically: after `apply`
/// returns, either every write is visible or none is.
pub trait StateStore: Send + Sync {
    /// Point lookup.
    fn get(&self, key: &RowKey) -> StoreResult<Option<StoredRow>>;

    /// Applies every write in `batch`, atomically.
    fn apply(&self, batch: WriteBatch) -> StoreResult<()>;

    /// Every row of `table`, ordered by `(scope, primary)`.
    fn scan(&self, table: Name) -> StoreResult<Vec<(RowKey, StoredRow)>>;
}
