//! Resumable, resize-tolerant full enumeration.
//!
//! The cursor is a reverse-binary counter: unmasked bits are set before
//! reversing, incrementing, and reversing back, so successive cursors
//! flip high-order bits first. A bucket index valid under a smaller mask
//! expands, after any number of table doublings, into a contiguous set of
//! indices under the larger mask — which is what lets a scan survive
//! arbitrary grow/shrink cycles between calls.
//!
//! Guarantee: every key present for the entire scan is emitted at least
//! once. Duplicates are permitted; keys added or removed mid-scan may or
//! may not be observed; there is no ordering guarantee.

use crate::dict::Dict;
use crate::types::DictType;

impl<K, V, T: DictType<K, V>> Dict<K, V, T> {
    /// Visit one cursor position and return the next cursor. Start with
    /// `0`; a returned `0` ends the scan. Unlike the iterators, `scan`
    /// never advances the rehash cursor, so it composes with snapshotting.
    pub fn scan<F>(&self, cursor: u64, mut visit: F) -> u64
    where
        F: FnMut(&K, &V),
    {
        if self.is_empty() {
            return 0;
        }
        let mut v = cursor;

        if !self.is_rehashing() {
            let m0 = self.ht[0].mask() as u64;
            self.scan_bucket(0, (v & m0) as usize, &mut visit);
            v |= !m0;
        } else {
            // Visit the small table's bucket, then every bucket of the
            // large table it expands into.
            let (small, large) = if self.ht[0].size() <= self.ht[1].size() {
                (0, 1)
            } else {
                (1, 0)
            };
            let m0 = self.ht[small].mask() as u64;
            let m1 = self.ht[large].mask() as u64;

            self.scan_bucket(small, (v & m0) as usize, &mut visit);
            loop {
                self.scan_bucket(large, (v & m1) as usize, &mut visit);
                // Increment the bits not covered by the smaller mask.
                v = (((v | m0).wrapping_add(1)) & !m0) | (v & m0);
                if v & (m0 ^ m1) == 0 {
                    break;
                }
            }
            v |= !m0;
        }

        // Reverse-binary increment over the masked bits.
        v = v.reverse_bits();
        v = v.wrapping_add(1);
        v.reverse_bits()
    }

    fn scan_bucket<F>(&self, t: usize, idx: usize, visit: &mut F)
    where
        F: FnMut(&K, &V),
    {
        let mut cur = self.ht[t].buckets[idx];
        while let Some(id) = cur {
            let e = &self.entries[id];
            visit(&e.key, &e.val);
            cur = e.next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn dict_with(n: u64) -> Dict<u64, u64> {
        let mut d = Dict::new();
        for i in 0..n {
            d.add(i, i).unwrap();
        }
        d
    }

    /// Drive a complete scan cycle, panicking if it fails to terminate.
    fn full_scan(d: &Dict<u64, u64>, mut between: impl FnMut(&mut BTreeSet<u64>)) -> BTreeSet<u64> {
        let mut seen = BTreeSet::new();
        let mut cursor = 0u64;
        for round in 0.. {
            assert!(round < 100_000, "scan failed to terminate");
            cursor = d.scan(cursor, |k, _| {
                seen.insert(*k);
            });
            if cursor == 0 {
                break;
            }
            between(&mut seen);
        }
        seen
    }

    /// Invariant: scanning an empty dictionary terminates immediately.
    #[test]
    fn empty_scan() {
        let d: Dict<u64, u64> = Dict::new();
        assert_eq!(d.scan(0, |_, _| {}), 0);
    }

    /// Invariant: a full cycle over a stable dictionary emits every key.
    #[test]
    fn stable_scan_covers_all() {
        let mut d = dict_with(200);
        while d.rehash(100) {}
        let seen = full_scan(&d, |_| {});
        assert_eq!(seen, (0..200).collect());
    }

    /// Invariant: a scan over a dictionary frozen mid-migration emits
    /// every key, drawing from both tables.
    #[test]
    fn mid_rehash_scan_covers_all() {
        let mut d = dict_with(100);
        while d.rehash(100) {}
        d.expand(1024).unwrap();
        d.rehash(7);
        assert!(d.is_rehashing());
        let seen = full_scan(&d, |_| {});
        assert_eq!(seen, (0..100).collect());
    }

    /// Invariant: growing the table (and advancing the migration) between
    /// scan calls never causes a key present throughout to be skipped.
    #[test]
    fn scan_survives_growth_between_calls() {
        let mut d = dict_with(64);
        while d.rehash(100) {}

        let mut seen = BTreeSet::new();
        let mut cursor = 0u64;
        let mut extra = 1000u64;
        for round in 0.. {
            assert!(round < 100_000, "scan failed to terminate");
            cursor = d.scan(cursor, |k, _| {
                seen.insert(*k);
            });
            if cursor == 0 {
                break;
            }
            // Stir: new keys and incremental migration between calls.
            // Stop adding after a while; a table that grows forever is
            // allowed to keep a scan from ever completing.
            if round < 32 {
                d.add(extra, extra).unwrap();
                extra += 1;
            }
            d.rehash(1);
        }
        for i in 0..64 {
            assert!(seen.contains(&i), "key {i} skipped");
        }
    }

    /// Invariant: shrinking between calls (bulk delete plus resize) still
    /// emits every key that survives the whole scan.
    #[test]
    fn scan_survives_shrink_between_calls() {
        let mut d = dict_with(256);
        while d.rehash(100) {}
        assert!(d.table_size() >= 256);

        let mut seen = BTreeSet::new();
        let mut cursor = 0u64;
        let mut doomed = 255u64;
        let mut shrunk = false;
        for round in 0.. {
            assert!(round < 100_000, "scan failed to terminate");
            cursor = d.scan(cursor, |k, _| {
                seen.insert(*k);
            });
            if cursor == 0 {
                break;
            }
            // Remove keys 128..=255 over the first rounds, then compact.
            if doomed >= 128 {
                let _ = d.remove(&doomed);
                doomed -= 1;
            } else if !shrunk {
                let _ = d.resize();
                shrunk = true;
            }
            d.rehash(1);
        }
        for i in 0..128 {
            assert!(seen.contains(&i), "persistent key {i} skipped");
        }
    }

    /// Invariant: the cursor sequence for a fixed mask enumerates every
    /// bucket exactly once (reverse-binary counting is a permutation).
    #[test]
    fn cursor_sequence_is_a_permutation() {
        let mut d = dict_with(16);
        while d.rehash(100) {}
        let size = d.table_size() as u64;
        let mask = size - 1;

        let mut cursors = BTreeSet::new();
        let mut cursor = 0u64;
        loop {
            cursors.insert(cursor & mask);
            cursor = d.scan(cursor, |_, _| {});
            if cursor == 0 {
                break;
            }
        }
        assert_eq!(cursors.len() as u64, size);
    }
}
