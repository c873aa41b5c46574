//! Durable accumulation of friend-code rows.
//!
//! The store is append-only from the collector's point of view: rows are
//! added once, keyed by friend code, and never rewritten.

pub mod csv_store;
pub mod error;

use std::collections::HashSet;

pub use csv_store::{CsvStore, HEADER};
pub use error::StoreError;

use pogo_core::StampedFriend;

/// Keyed append store for persisted friend records.
///
/// Implementations must not hold the backing resource open between calls.
pub trait RecordStore: Send + Sync {
    /// Whether a row with `code` has already been persisted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing data cannot be read.
    fn exists(&self, code: &str) -> Result<bool, StoreError> {
        Ok(self.all_codes()?.contains(code))
    }

    /// Every persisted friend code.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing data cannot be read.
    fn all_codes(&self) -> Result<HashSet<String>, StoreError>;

    /// Appends one row. Callers guarantee the code is not already present.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the row cannot be written.
    fn append(&self, friend: &StampedFriend) -> Result<(), StoreError>;

    /// Number of persisted rows.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing data cannot be read.
    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.load_all()?.len())
    }

    /// All persisted rows in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing data cannot be read.
    fn load_all(&self) -> Result<Vec<StampedFriend>, StoreError>;
}
