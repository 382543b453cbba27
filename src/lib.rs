//! incremental-dict: a single-threaded chained hash map that resizes
//! without ever pausing for a full rehash.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: O(1) amortized keyed access that stays responsive while the
//!   table grows or shrinks, tolerates mutation mid-iteration, and
//!   supports a full enumeration that survives arbitrary resizes.
//! - Layers:
//!   - Table/Entry: power-of-two bucket arrays over one slotmap arena;
//!     chains are generational `EntryId` links, so migration relinks
//!     indices and never moves, copies, or re-allocates a live entry.
//!   - Dict<K, V, T>: the public map. Owns the arena, the active table
//!     `ht[0]`, the migration target `ht[1]`, the rehash cursor, and the
//!     safe-iterator counter. Behavior is parameterized by a `DictType`
//!     capability descriptor with a threaded context.
//!   - Rehash engine: migrates one source bucket per step; steps are
//!     folded opportunistically into map operations (including lookups)
//!     and batched by a time-boxed maintenance call (`rehash_for`).
//!   - SafeIter/UnsafeIter: detached traversal sessions — advances take
//!     the map as a parameter, so sessions and handles never borrow it.
//!   - scan: reverse-binary cursor enumeration that may be resumed after
//!     any number of resizes between calls.
//!
//! Constraints
//! - Single-threaded, cooperative: no locking, no suspension; callers
//!   needing threads serialize externally.
//! - Unique keys; duplicate inserts fail with `DictError::KeyExists`.
//! - The only pause an operation introduces is its own bounded rehash
//!   step (one bucket-chain relink, plus an unbounded-but-cheap skip
//!   over empty source buckets).
//! - While any safe iterator is open, rehash progress is frozen
//!   dictionary-wide; entries cannot move between tables mid-traversal.
//! - Allocation failure aborts, as `Vec` does; there is no recovery path.
//!
//! Resize policy
//! - Expansion triggers at load factor >= 1 while resizing is enabled, or
//!   unconditionally once the integer ratio used/size exceeds the
//!   configured force ratio. The forced path deliberately overrides a
//!   disabled resize flag: disabling (e.g. during a forked snapshot, to
//!   limit copy-on-write churn) must not let chains grow without bound.
//! - `resize()` shrinks toward a 1:1 ratio and is refused while resizing
//!   is disabled or a migration is in progress.
//!
//! Iterator misuse detection
//! - An unsafe iterator fingerprints both tables (array identity, size,
//!   used) on first advance and re-checks on release; a mismatch panics.
//!   This replaces "undefined behavior on concurrent mutation" with an
//!   explicit, testable fatal check.
//!
//! Notes and non-goals
//! - `random_entry` picks a random bucket, then a random chain position;
//!   only approximately uniform over keys when chain lengths differ.
//! - No network protocol, persistence, or replication concerns; those
//!   collaborators drive this map through its public surface (`scan`,
//!   `rehash_for`, the resize toggles) and the `DictType` destroy hooks.
//! - Key/value duplication from the original callback contract collapses
//!   into move semantics; callers clone explicitly to retain copies.

mod dict;
mod hash;
mod iter;
mod rehash;
mod scan;
mod table;
mod types;

// Public surface
pub use dict::{Dict, EntryHandle};
pub use hash::MIN_TABLE_SIZE;
pub use iter::{SafeIter, UnsafeIter};
pub use types::{DefaultDictType, DictConfig, DictError, DictType};
