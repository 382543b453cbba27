//! Bucket table and arena entry types.
//!
//! Entries live in a single slotmap arena shared by both tables; bucket
//! chains are generational `EntryId` links, so an incremental migration
//! relinks indices without moving or copying the entries themselves, and
//! a stale handle can never alias a recycled slot.

use slotmap::new_key_type;

use crate::hash::next_table_size;

new_key_type! {
    /// Generational arena key for one entry.
    pub(crate) struct EntryId;
}

/// One key/value pair plus its chain continuation.
#[derive(Debug)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) val: V,
    pub(crate) next: Option<EntryId>,
}

/// A power-of-two array of bucket heads. `buckets.is_empty()` encodes the
/// unallocated state of a fresh or finished-migrating table.
#[derive(Debug, Default)]
pub(crate) struct Table {
    pub(crate) buckets: Vec<Option<EntryId>>,
    pub(crate) used: usize,
}

impl Table {
    /// Allocate a zeroed table sized to the next power of two >= `capacity`
    /// (minimum 4).
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Table {
            buckets: vec![None; next_table_size(capacity)],
            used: 0,
        }
    }

    pub(crate) fn size(&self) -> usize {
        self.buckets.len()
    }

    /// Bucket mask; only meaningful for allocated tables.
    pub(crate) fn mask(&self) -> usize {
        debug_assert!(!self.buckets.is_empty());
        self.buckets.len() - 1
    }

    /// Return to the unallocated state.
    pub(crate) fn reset(&mut self) {
        self.buckets = Vec::new();
        self.used = 0;
    }
}
