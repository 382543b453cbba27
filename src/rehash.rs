//! Incremental migration engine.
//!
//! Migration moves bucket chains from `ht[0]` to `ht[1]` one source
//! bucket at a time, relinking arena ids rather than copying entries.
//! Steps are driven two ways: opportunistically (one step folded into
//! most dictionary operations) and explicitly (`rehash`/`rehash_for`,
//! meant for an idle-cycle maintenance task).

use std::time::{Duration, Instant};

use crate::dict::Dict;
use crate::types::DictType;

impl<K, V, T: DictType<K, V>> Dict<K, V, T> {
    /// Perform up to `n` bucket migrations. Returns `true` while more
    /// migration work remains, `false` once the dictionary is back to a
    /// single table.
    ///
    /// A step skips empty source buckets without bound, so one call can
    /// scan arbitrarily far through a sparse table; that costs time, not
    /// correctness.
    pub fn rehash(&mut self, n: usize) -> bool {
        if !self.is_rehashing() {
            return false;
        }
        for _ in 0..n {
            // Source drained: promote the target and finish.
            if self.ht[0].used == 0 {
                self.ht[0] = core::mem::take(&mut self.ht[1]);
                self.rehash_idx = None;
                return false;
            }

            let mut idx = self.rehash_idx.unwrap_or(0);
            debug_assert!(idx < self.ht[0].size());
            while self.ht[0].buckets[idx].is_none() {
                idx += 1;
            }

            // Relink the whole chain into the target, head insertion per
            // entry under the target's mask.
            let mut cur = self.ht[0].buckets[idx].take();
            while let Some(id) = cur {
                cur = self.entries[id].next.take();
                let h = self.hash_key(&self.entries[id].key);
                let dst = (h as usize) & self.ht[1].mask();
                let head = self.ht[1].buckets[dst].take();
                self.entries[id].next = head;
                self.ht[1].buckets[dst] = Some(id);
                self.ht[0].used -= 1;
                self.ht[1].used += 1;
            }
            self.rehash_idx = Some(idx + 1);
        }
        true
    }

    /// Migrate in batches of 100 buckets until done or the wall-clock
    /// budget is exceeded. Stopping early is always safe; the migration
    /// resumes on the next call or opportunistic step. Returns the number
    /// of batched steps performed.
    pub fn rehash_for(&mut self, budget: Duration) -> usize {
        let start = Instant::now();
        let mut steps = 0;
        while self.rehash(100) {
            steps += 100;
            if start.elapsed() > budget {
                break;
            }
        }
        steps
    }

    /// One opportunistic step, suppressed while any safe iterator is open
    /// so entries cannot move between tables mid-traversal.
    pub(crate) fn rehash_step(&mut self) {
        if self.safe_iterators == 0 {
            self.rehash(1);
        }
    }
}
