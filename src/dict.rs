//! Core dictionary: two bucket tables over one entry arena, with
//! opportunistic incremental rehashing folded into every mutating (and
//! most reading) operation.

use core::mem;
use rustc_hash::FxSeededState;
use slotmap::SlotMap;

use crate::hash::{splitmix64, MIN_TABLE_SIZE};
use crate::table::{Entry, EntryId, Table};
use crate::types::{DefaultDictType, DictConfig, DictError, DictType};

/// Stable reference to one entry. Detached from the dictionary: accessors
/// take the map as a parameter, so holding a handle never blocks other
/// operations. A handle goes dead (accessors return `None`) once its entry
/// is deleted, and can never alias a later entry in the same slot.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct EntryHandle(EntryId);

impl EntryHandle {
    pub(crate) fn new(id: EntryId) -> Self {
        EntryHandle(id)
    }

    pub(crate) fn id(&self) -> EntryId {
        self.0
    }

    pub fn key<'a, K, V, T>(&self, d: &'a Dict<K, V, T>) -> Option<&'a K>
    where
        T: DictType<K, V>,
    {
        d.entries.get(self.0).map(|e| &e.key)
    }

    pub fn value<'a, K, V, T>(&self, d: &'a Dict<K, V, T>) -> Option<&'a V>
    where
        T: DictType<K, V>,
    {
        d.entries.get(self.0).map(|e| &e.val)
    }

    pub fn value_mut<'a, K, V, T>(&self, d: &'a mut Dict<K, V, T>) -> Option<&'a mut V>
    where
        T: DictType<K, V>,
    {
        d.entries.get_mut(self.0).map(|e| &mut e.val)
    }
}

/// Incrementally-rehashed chained hash map.
///
/// `ht[0]` is the active table; `ht[1]` exists only while a migration is
/// in progress (`rehash_idx` is `Some`). Single-threaded by design: no
/// internal locking, no operation suspends, and the only pause any
/// operation introduces is the bounded rehash step it performs.
pub struct Dict<K, V, T: DictType<K, V> = DefaultDictType> {
    pub(crate) ty: T,
    pub(crate) ctx: T::Context,
    pub(crate) config: DictConfig,
    pub(crate) entries: SlotMap<EntryId, Entry<K, V>>,
    pub(crate) ht: [Table; 2],
    /// `Some(i)`: migration in progress, next source bucket is `ht[0][i]`.
    pub(crate) rehash_idx: Option<usize>,
    /// While non-zero, opportunistic rehash steps are suppressed.
    pub(crate) safe_iterators: usize,
    rng: u64,
}

impl<K: core::hash::Hash + Eq, V> Dict<K, V> {
    /// Empty dictionary with default configuration; both tables start
    /// unallocated.
    pub fn new() -> Self {
        Self::with_config(DictConfig::default())
    }

    /// Empty dictionary with the given tunables; the hash seed is consumed
    /// here, once.
    pub fn with_config(config: DictConfig) -> Self {
        let ctx = FxSeededState::with_seed(config.seed as usize);
        Self::with_type(DefaultDictType, ctx, config)
    }
}

impl<K: core::hash::Hash + Eq, V> Default for Dict<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, T: DictType<K, V>> Dict<K, V, T> {
    /// Empty dictionary driven by a custom type descriptor and its context.
    pub fn with_type(ty: T, ctx: T::Context, config: DictConfig) -> Self {
        Dict {
            ty,
            ctx,
            rng: config.seed,
            config,
            entries: SlotMap::with_key(),
            ht: [Table::default(), Table::default()],
            rehash_idx: None,
            safe_iterators: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.ht[0].used + self.ht[1].used
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the active table's bucket array (0 before first insert).
    pub fn table_size(&self) -> usize {
        self.ht[0].size()
    }

    pub fn is_rehashing(&self) -> bool {
        self.rehash_idx.is_some()
    }

    pub fn config(&self) -> &DictConfig {
        &self.config
    }

    /// Allow load-factor-1 expansion and `resize()` shrinking.
    pub fn enable_resize(&mut self) {
        self.config.resize_enabled = true;
    }

    /// Suppress automatic resizing (forced expansion still applies once
    /// the load factor exceeds `force_resize_ratio`).
    pub fn disable_resize(&mut self) {
        self.config.resize_enabled = false;
    }

    pub(crate) fn hash_key(&self, key: &K) -> u64 {
        self.ty.hash(&self.ctx, key)
    }

    pub(crate) fn keys_equal(&self, a: &K, b: &K) -> bool {
        self.ty.keys_equal(&self.ctx, a, b)
    }

    /// Insert a new key/value pair. Fails with `KeyExists` when the key is
    /// already present in either table.
    pub fn add(&mut self, key: K, val: V) -> Result<EntryHandle, DictError> {
        self.add_with(key, move || val)
    }

    /// Insert a key whose value is built only once the key is known to be
    /// absent; the returned handle lets the caller populate it further.
    pub fn add_with<F>(&mut self, key: K, make: F) -> Result<EntryHandle, DictError>
    where
        F: FnOnce() -> V,
    {
        if self.is_rehashing() {
            self.rehash_step();
        }
        let idx = self.key_index(&key)?;
        // New entries always land in the migration target while rehashing.
        let t = usize::from(self.is_rehashing());
        let head = self.ht[t].buckets[idx];
        let id = self.entries.insert(Entry {
            key,
            val: make(),
            next: head,
        });
        self.ht[t].buckets[idx] = Some(id);
        self.ht[t].used += 1;
        Ok(EntryHandle::new(id))
    }

    /// Upsert. Returns `true` when the key was absent and freshly
    /// inserted, `false` when an existing value was overwritten.
    ///
    /// On overwrite the old value is captured first, the new one
    /// installed, and only then is the old value released through the
    /// descriptor; the ordering matters when old and new may share
    /// reference-counted state.
    pub fn replace(&mut self, key: K, val: V) -> bool {
        if self.is_rehashing() {
            self.rehash_step();
        }
        if let Some((_, id)) = self.locate(&key) {
            let old = mem::replace(&mut self.entries[id].val, val);
            self.ty.destroy_val(&self.ctx, old);
            return false;
        }
        let inserted = self.add(key, val);
        debug_assert!(inserted.is_ok());
        true
    }

    /// Look up a key, advancing the migration by one step. Read paths are
    /// not exempt from the amortization policy, hence `&mut self`.
    pub fn find(&mut self, key: &K) -> Option<EntryHandle> {
        if self.ht[0].size() == 0 {
            return None;
        }
        if self.is_rehashing() {
            self.rehash_step();
        }
        self.locate(key).map(|(_, id)| EntryHandle::new(id))
    }

    /// Look up a key and borrow its value.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let h = self.find(key)?;
        self.entries.get(h.id()).map(|e| &e.val)
    }

    /// Look up a key and borrow its value mutably.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let h = self.find(key)?;
        self.entries.get_mut(h.id()).map(|e| &mut e.val)
    }

    pub fn contains_key(&mut self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Unlink a key and release its payload through the descriptor's
    /// destroy hooks.
    pub fn delete(&mut self, key: &K) -> Result<(), DictError> {
        let (k, v) = self.unlink(key).ok_or(DictError::KeyNotFound)?;
        self.ty.destroy_key(&self.ctx, k);
        self.ty.destroy_val(&self.ctx, v);
        Ok(())
    }

    /// Unlink a key and hand its payload back to the caller, bypassing the
    /// destroy hooks.
    pub fn remove(&mut self, key: &K) -> Option<(K, V)> {
        self.unlink(key)
    }

    /// Pre-size the table. Installs directly as the active table when the
    /// dictionary is still unallocated; otherwise installs the migration
    /// target and starts rehashing. Refused while a migration is already
    /// in progress or when `target` cannot hold the live entries.
    pub fn expand(&mut self, target: usize) -> Result<(), DictError> {
        if self.is_rehashing() || self.ht[0].used > target {
            return Err(DictError::ResizeRefused);
        }
        self.grow(target);
        Ok(())
    }

    /// Shrink the table toward a 1:1 used/size ratio. Refused while
    /// resizing is disabled or a migration is in progress.
    pub fn resize(&mut self) -> Result<(), DictError> {
        if !self.config.resize_enabled || self.is_rehashing() {
            return Err(DictError::ResizeRefused);
        }
        self.expand(self.ht[0].used.max(MIN_TABLE_SIZE))
    }

    /// Return some entry, chosen by random bucket then random chain
    /// position. Only approximately uniform over keys when chain lengths
    /// vary; callers wanting exact uniformity must sample differently.
    pub fn random_entry(&mut self) -> Option<EntryHandle> {
        if self.is_empty() {
            return None;
        }
        if self.is_rehashing() {
            self.rehash_step();
        }
        let head = if self.is_rehashing() {
            let s0 = self.ht[0].size();
            let total = s0 + self.ht[1].size();
            loop {
                let r = (splitmix64(&mut self.rng) as usize) % total;
                let head = if r < s0 {
                    self.ht[0].buckets[r]
                } else {
                    self.ht[1].buckets[r - s0]
                };
                if head.is_some() {
                    break head;
                }
            }
        } else {
            loop {
                let r = (splitmix64(&mut self.rng) as usize) & self.ht[0].mask();
                let head = self.ht[0].buckets[r];
                if head.is_some() {
                    break head;
                }
            }
        };

        let mut chain_len = 0usize;
        let mut cur = head;
        while let Some(id) = cur {
            chain_len += 1;
            cur = self.entries[id].next;
        }
        let mut pick = (splitmix64(&mut self.rng) as usize) % chain_len;
        let mut id = head?;
        while pick > 0 {
            if let Some(next) = self.entries[id].next {
                id = next;
            }
            pick -= 1;
        }
        Some(EntryHandle::new(id))
    }

    /// Release every entry through the destroy hooks and reset both
    /// tables, cancelling any migration in progress.
    pub fn clear(&mut self) {
        let entries = mem::take(&mut self.entries);
        for (_, e) in entries {
            self.ty.destroy_key(&self.ctx, e.key);
            self.ty.destroy_val(&self.ctx, e.val);
        }
        self.ht[0].reset();
        self.ht[1].reset();
        self.rehash_idx = None;
        self.safe_iterators = 0;
    }

    /// Walk both tables (when rehashing) for `key`. Caller guards against
    /// an unallocated `ht[0]`.
    pub(crate) fn locate(&self, key: &K) -> Option<(usize, EntryId)> {
        if self.ht[0].size() == 0 {
            return None;
        }
        let h = self.hash_key(key);
        for t in 0..=1 {
            let idx = (h as usize) & self.ht[t].mask();
            let mut cur = self.ht[t].buckets[idx];
            while let Some(id) = cur {
                let e = &self.entries[id];
                if self.keys_equal(key, &e.key) {
                    return Some((t, id));
                }
                cur = e.next;
            }
            if !self.is_rehashing() {
                break;
            }
        }
        None
    }

    fn unlink(&mut self, key: &K) -> Option<(K, V)> {
        if self.ht[0].size() == 0 {
            return None;
        }
        if self.is_rehashing() {
            self.rehash_step();
        }
        let h = self.hash_key(key);
        for t in 0..=1 {
            let idx = (h as usize) & self.ht[t].mask();
            let mut prev: Option<EntryId> = None;
            let mut cur = self.ht[t].buckets[idx];
            while let Some(id) = cur {
                if self.keys_equal(key, &self.entries[id].key) {
                    let next = self.entries[id].next;
                    match prev {
                        None => self.ht[t].buckets[idx] = next,
                        Some(p) => self.entries[p].next = next,
                    }
                    let e = self
                        .entries
                        .remove(id)
                        .expect("chained entry present in arena");
                    self.ht[t].used -= 1;
                    return Some((e.key, e.val));
                }
                prev = cur;
                cur = self.entries[id].next;
            }
            if !self.is_rehashing() {
                break;
            }
        }
        None
    }

    /// Bucket index in the active table where `key` should be inserted, or
    /// `KeyExists`. Triggers expansion as a side effect when the policy
    /// calls for it; while rehashing, the returned index is always for the
    /// migration target.
    fn key_index(&mut self, key: &K) -> Result<usize, DictError> {
        self.expand_if_needed();
        let h = self.hash_key(key);
        for t in 0..=1 {
            let idx = (h as usize) & self.ht[t].mask();
            let mut cur = self.ht[t].buckets[idx];
            while let Some(id) = cur {
                let e = &self.entries[id];
                if self.keys_equal(key, &e.key) {
                    return Err(DictError::KeyExists);
                }
                cur = e.next;
            }
            if !self.is_rehashing() {
                break;
            }
        }
        let t = usize::from(self.is_rehashing());
        Ok((h as usize) & self.ht[t].mask())
    }

    /// Expansion policy. The force-ratio branch deliberately overrides a
    /// disabled resize flag: snapshot-friendly suppression must not let
    /// chains grow without bound.
    fn expand_if_needed(&mut self) {
        if self.is_rehashing() {
            return;
        }
        if self.ht[0].size() == 0 {
            self.grow(MIN_TABLE_SIZE);
            return;
        }
        let used = self.ht[0].used;
        let size = self.ht[0].size();
        if used >= size && (self.config.resize_enabled || used / size > self.config.force_resize_ratio)
        {
            self.grow(used * 2);
        }
    }

    /// Install a fresh table: as `ht[0]` for pure initialization, else as
    /// the migration target with the cursor at bucket 0.
    fn grow(&mut self, target: usize) {
        let fresh = Table::with_capacity(target);
        if self.ht[0].size() == 0 {
            self.ht[0] = fresh;
        } else {
            self.ht[1] = fresh;
            self.rehash_idx = Some(0);
        }
    }
}

impl<K, V, T: DictType<K, V>> Drop for Dict<K, V, T> {
    fn drop(&mut self) {
        self.clear();
    }
}
