//! Safe and unsafe iteration.
//!
//! Both variants share one traversal order: ascending buckets of `ht[0]`,
//! then, only while rehashing, ascending buckets of `ht[1]`, chain order
//! within a bucket. Iterators are detached — they hold no borrow of the
//! dictionary; every advance takes it as a parameter — so the caller
//! keeps full access to the map between calls.
//!
//! - [`SafeIter`] freezes opportunistic rehash progress for its lifetime
//!   (counter-gated), which makes it legal to add, look up, and delete
//!   the most recently yielded entry while iterating.
//! - [`UnsafeIter`] permits nothing but iteration: a structural
//!   fingerprint is captured on first advance and re-checked on release,
//!   and a mismatch is a fatal assertion — a misuse detector for caller
//!   bugs, not a recoverable error.

use crate::dict::{Dict, EntryHandle};
use crate::hash::mix64;
use crate::table::EntryId;
use crate::types::DictType;

impl<K, V, T: DictType<K, V>> Dict<K, V, T> {
    /// Structural identity of both tables: bucket array addresses, sizes
    /// and used counts, folded through an integer mix so the same values
    /// in a different order (very likely) disagree.
    pub(crate) fn fingerprint(&self) -> u64 {
        let ints = [
            self.ht[0].buckets.as_ptr() as u64,
            self.ht[0].size() as u64,
            self.ht[0].used as u64,
            self.ht[1].buckets.as_ptr() as u64,
            self.ht[1].size() as u64,
            self.ht[1].used as u64,
        ];
        let mut h = 0u64;
        for i in ints {
            h = mix64(h.wrapping_add(i));
        }
        h
    }

    /// Iterator that tolerates concurrent mutation by pausing rehash
    /// progress. Call [`SafeIter::release`] when done.
    pub fn safe_iter(&self) -> SafeIter {
        SafeIter {
            state: IterState::default(),
        }
    }

    /// Iterator that forbids any dictionary access besides its own calls
    /// for its lifetime; violations trip a fatal fingerprint assertion on
    /// [`UnsafeIter::release`]. Note that lookups count as mutation here:
    /// read paths advance the rehash cursor.
    pub fn unsafe_iter(&self) -> UnsafeIter {
        UnsafeIter {
            state: IterState::default(),
            fingerprint: 0,
        }
    }
}

/// Shared traversal state. `pending` always holds the next entry to
/// yield; it is captured when the previous entry is returned, so deleting
/// the yielded entry cannot break the chain walk.
#[derive(Debug, Default)]
struct IterState {
    table: usize,
    bucket: Option<usize>,
    pending: Option<EntryId>,
    started: bool,
    done: bool,
}

impl IterState {
    fn advance<K, V, T>(&mut self, d: &Dict<K, V, T>) -> Option<EntryHandle>
    where
        T: DictType<K, V>,
    {
        loop {
            if let Some(id) = self.pending.take() {
                if let Some(e) = d.entries.get(id) {
                    self.pending = e.next;
                    return Some(EntryHandle::new(id));
                }
                // Stale continuation: something beyond the yielded entry
                // was deleted, which the contract forbids. Fall through to
                // the next bucket rather than touch a dead id.
            }
            if self.done {
                return None;
            }
            let (table, bucket) = match self.bucket {
                None => (0, 0),
                Some(b) => {
                    if b + 1 < d.ht[self.table].size() {
                        (self.table, b + 1)
                    } else if self.table == 0 && d.is_rehashing() {
                        (1, 0)
                    } else {
                        self.done = true;
                        return None;
                    }
                }
            };
            self.table = table;
            self.bucket = Some(bucket);
            self.pending = d.ht[table].buckets.get(bucket).copied().flatten();
        }
    }
}

/// Traversal session that keeps the dictionary usable while open. The
/// first advance increments the dictionary's safe-iterator counter,
/// suppressing opportunistic rehash steps until `release`.
#[derive(Debug)]
pub struct SafeIter {
    state: IterState,
}

impl SafeIter {
    pub fn next<K, V, T>(&mut self, d: &mut Dict<K, V, T>) -> Option<EntryHandle>
    where
        T: DictType<K, V>,
    {
        if !self.state.started {
            self.state.started = true;
            d.safe_iterators += 1;
        }
        self.state.advance(d)
    }

    /// End the session, re-enabling rehash progress. A session that never
    /// advanced has nothing to undo.
    pub fn release<K, V, T>(self, d: &mut Dict<K, V, T>)
    where
        T: DictType<K, V>,
    {
        if self.state.started {
            debug_assert!(d.safe_iterators > 0);
            d.safe_iterators -= 1;
        }
    }
}

/// Traversal session that assumes an untouched dictionary. Cheaper than
/// [`SafeIter`] (rehash keeps running between sessions) but any mutation
/// before `release` is a caller bug caught fatally.
#[derive(Debug)]
pub struct UnsafeIter {
    state: IterState,
    fingerprint: u64,
}

impl UnsafeIter {
    pub fn next<K, V, T>(&mut self, d: &Dict<K, V, T>) -> Option<EntryHandle>
    where
        T: DictType<K, V>,
    {
        if !self.state.started {
            self.state.started = true;
            self.fingerprint = d.fingerprint();
        }
        self.state.advance(d)
    }

    /// End the session, verifying the dictionary was not mutated since
    /// the first advance. Panics on mismatch.
    pub fn release<K, V, T>(self, d: &Dict<K, V, T>)
    where
        T: DictType<K, V>,
    {
        if self.state.started {
            assert!(
                self.fingerprint == d.fingerprint(),
                "dictionary mutated during unsafe iteration"
            );
        }
    }
}
