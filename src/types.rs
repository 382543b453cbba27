//! Type descriptor, per-instance configuration, and error taxonomy.

use core::hash::{BuildHasher, Hash};
use rustc_hash::FxSeededState;

/// Recoverable dictionary errors, reported as `Result` values.
///
/// Allocation failure is deliberately absent: an exhausted allocator
/// aborts the process (standard `Vec`/`SlotMap` behavior), and unsafe
/// iterator misuse is a fatal assertion, not an error value.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DictError {
    /// `add`/`add_with` on a key already present in either table.
    KeyExists,
    /// `delete` (or another keyed operation) missed in both tables.
    KeyNotFound,
    /// `expand`/`resize` while a migration is in progress, the target is
    /// too small, or automatic resizing is disabled.
    ResizeRefused,
}

/// Per-instance tunables. The original design kept these as process-wide
/// globals; here they are explicit fields so each dictionary carries its
/// own policy with a visible lifecycle.
#[derive(Copy, Clone, Debug)]
pub struct DictConfig {
    /// Hash seed, consumed once when the dictionary (and its default
    /// hasher context) is constructed. Read-only afterwards.
    pub seed: u64,
    /// Whether load-factor-1 expansion and `resize()` shrinking are
    /// allowed. Toggled at runtime via `Dict::{enable,disable}_resize`,
    /// typically disabled while a forked snapshot is in flight.
    pub resize_enabled: bool,
    /// Load factor above which expansion happens even with resizing
    /// disabled, so chains cannot grow without bound.
    pub force_resize_ratio: usize,
}

impl Default for DictConfig {
    fn default() -> Self {
        DictConfig {
            seed: 5381,
            resize_enabled: true,
            force_resize_ratio: 5,
        }
    }
}

/// Capability set parameterizing hashing, key comparison, and payload
/// release. Injected at dictionary creation together with an opaque
/// `Context` that is threaded through every callback.
///
/// Key/value duplication from the original callback contract collapses
/// into Rust move semantics: the dictionary always takes ownership on
/// insert, and callers clone beforehand when they want to retain a copy.
/// The destroy hooks default to ordinary drops; an object layer can
/// override them to intercept release of reference-counted payloads.
pub trait DictType<K, V> {
    /// Opaque configuration threaded through every callback.
    type Context;

    /// Hash a key. Must be stable for the lifetime of the dictionary.
    fn hash(&self, ctx: &Self::Context, key: &K) -> u64;

    /// Key equality used during probing, deletion, and migration checks.
    fn keys_equal(&self, ctx: &Self::Context, a: &K, b: &K) -> bool;

    /// Release a key the dictionary owned. Default: drop.
    fn destroy_key(&self, ctx: &Self::Context, key: K) {
        let _ = (ctx, key);
    }

    /// Release a value the dictionary owned. Default: drop.
    fn destroy_val(&self, ctx: &Self::Context, val: V) {
        let _ = (ctx, val);
    }
}

/// Default descriptor for `K: Hash + Eq`: seeded Fx hashing with `==`
/// comparison and plain-drop release. Its context is the seeded hasher
/// state built from `DictConfig::seed`.
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultDictType;

impl<K: Hash + Eq, V> DictType<K, V> for DefaultDictType {
    type Context = FxSeededState;

    fn hash(&self, ctx: &Self::Context, key: &K) -> u64 {
        ctx.hash_one(key)
    }

    fn keys_equal(&self, _ctx: &Self::Context, a: &K, b: &K) -> bool {
        a == b
    }
}
