// Dict integration suite (consolidated).
//
// Each test documents the behavior verified and the invariants assumed.
// The core invariants exercised:
// - Bookkeeping: len() equals the number of distinct live keys under any
//   operation sequence.
// - Stability: after add(k, v), find/get observe v across any amount of
//   rehash progress until k is deleted.
// - Migration: driving the rehash engine to completion leaves a single
//   power-of-two table and a cleared cursor.
// - Traversal: safe iteration tolerates deletion of the yielded entry;
//   scan cycles cover every key that persists for the whole cycle.
// - Descriptors: custom hash/equality capability objects are honored on
//   every path (probe, delete, migrate).
use incremental_dict::{Dict, DictConfig, DictError, DictType};
use rustc_hash::FxSeededState;
use std::collections::BTreeSet;
use std::time::Duration;

// Test: the end-to-end thousand-key scenario.
// Assumes: tables start unallocated and double from the used count.
// Verifies: size bookkeeping, final table shape, even-key deletion.
#[test]
fn thousand_keys_scenario() {
    let mut d: Dict<u64, u64> = Dict::new();
    for i in 0..1000 {
        d.add(i, i).unwrap();
    }
    assert_eq!(d.len(), 1000);

    while d.rehash(100) {}
    assert!(!d.is_rehashing());
    assert!(d.table_size().is_power_of_two());
    assert!(d.table_size() >= 1000);

    for i in (0..1000).step_by(2) {
        d.delete(&i).unwrap();
    }
    assert_eq!(d.len(), 500);
    assert_eq!(d.delete(&2), Err(DictError::KeyNotFound));
    assert_eq!(d.get(&2), None);
    assert_eq!(d.get(&1), Some(&1));
}

// Test: lookup stability across arbitrary rehash progress.
// Assumes: migration relinks entries without destroying them.
// Verifies: get(k) == v at every single-step migration state.
#[test]
fn lookups_survive_every_migration_state() {
    let mut d: Dict<u64, u64> = Dict::new();
    for i in 0..128 {
        d.add(i, i * 3).unwrap();
    }
    while d.rehash(100) {}
    d.expand(2048).unwrap();

    let mut guard = 0;
    while d.is_rehashing() {
        assert!(guard < 10_000);
        guard += 1;
        d.rehash(1);
        let probe = guard as u64 % 128;
        assert_eq!(d.get(&probe), Some(&(probe * 3)));
    }
    assert_eq!(d.len(), 128);
}

// Test: time-boxed maintenance rehashing.
// Assumes: rehash_for stops early on budget exhaustion but is resumable.
// Verifies: repeated budgeted calls eventually finish the migration.
#[test]
fn budgeted_maintenance_completes() {
    let mut d: Dict<u64, u64> = Dict::new();
    for i in 0..4096 {
        d.add(i, i).unwrap();
    }
    while d.rehash(100) {}
    d.expand(32_768).unwrap();

    let mut guard = 0;
    while d.is_rehashing() {
        assert!(guard < 10_000);
        guard += 1;
        d.rehash_for(Duration::from_millis(1));
    }
    assert_eq!(d.len(), 4096);
    assert_eq!(d.table_size(), 32_768);
}

// Test: safe iteration interleaved with deletions and inserts.
// Assumes: deleting the yielded entry is legal; inserts during iteration
// may or may not be observed.
// Verifies: every pre-existing key is yielded exactly once.
#[test]
fn safe_iteration_with_mixed_mutation() {
    let mut d: Dict<u64, u64> = Dict::new();
    for i in 0..100 {
        d.add(i, i).unwrap();
    }

    let mut yielded = Vec::new();
    let mut fresh = 10_000u64;
    let mut it = d.safe_iter();
    while let Some(h) = it.next(&mut d) {
        let k = *h.key(&d).unwrap();
        yielded.push(k);
        if k < 100 && k % 3 == 0 {
            d.delete(&k).unwrap();
        }
        if k % 7 == 0 {
            let _ = d.add(fresh, fresh);
            fresh += 1;
        }
    }
    it.release(&mut d);

    let original: Vec<u64> = yielded.iter().copied().filter(|k| *k < 100).collect();
    assert_eq!(original.len(), 100, "no original key skipped or repeated");
    let set: BTreeSet<u64> = original.into_iter().collect();
    assert_eq!(set, (0..100).collect());
}

// Test: a scan cycle with expansion driven between calls.
// Assumes: cursor 0 terminates the cycle; duplicates are allowed.
// Verifies: keys present for the whole cycle are all emitted.
#[test]
fn scan_cycle_with_interleaved_resizes() {
    let mut d: Dict<u64, u64> = Dict::new();
    for i in 0..300 {
        d.add(i, i).unwrap();
    }

    let mut seen = BTreeSet::new();
    let mut cursor = 0u64;
    let mut round = 0u32;
    loop {
        assert!(round < 100_000, "scan failed to terminate");
        round += 1;
        cursor = d.scan(cursor, |k, _| {
            seen.insert(*k);
        });
        if cursor == 0 {
            break;
        }
        d.rehash(2);
        if round == 5 && !d.is_rehashing() {
            let _ = d.expand(d.table_size() * 2);
        }
    }
    assert_eq!(seen, (0..300).collect());
}

// Case-preserving keys compared and hashed case-insensitively, the way a
// protocol might treat command names.
struct AsciiCaseless;

impl DictType<String, u64> for AsciiCaseless {
    type Context = FxSeededState;

    fn hash(&self, ctx: &Self::Context, key: &String) -> u64 {
        use core::hash::BuildHasher;
        ctx.hash_one(key.to_ascii_lowercase())
    }

    fn keys_equal(&self, _ctx: &Self::Context, a: &String, b: &String) -> bool {
        a.eq_ignore_ascii_case(b)
    }
}

// Test: custom descriptor drives probing, deletion, and migration.
// Assumes: hash/equality callbacks are consulted on every path.
// Verifies: case variants collide; stored spelling is preserved; lookups
// still work after a full migration re-hashes every key.
#[test]
fn custom_descriptor_end_to_end() {
    let cfg = DictConfig::default();
    let mut d: Dict<String, u64, AsciiCaseless> =
        Dict::with_type(AsciiCaseless, FxSeededState::with_seed(cfg.seed as usize), cfg);

    let h = d.add("Get".to_string(), 1).unwrap();
    assert_eq!(
        d.add("GET".to_string(), 2),
        Err(DictError::KeyExists),
        "case variants are the same key"
    );
    assert_eq!(h.key(&d), Some(&"Get".to_string()), "spelling preserved");

    for i in 0..64 {
        d.add(format!("cmd{i}"), i).unwrap();
    }
    while d.rehash(100) {}
    assert_eq!(d.get(&"gEt".to_string()), Some(&1));
    assert_eq!(d.remove(&"GET".to_string()), Some(("Get".to_string(), 1)));
    assert_eq!(d.len(), 64);
}

// Test: snapshot-style usage of the control surface.
// Assumes: disabling resize defers growth (short of the force ratio) and
// scan does not advance the migration cursor.
// Verifies: a scan-everything loop under disabled resize sees a stable
// structure; re-enabling restores normal growth.
#[test]
fn snapshot_dump_pattern() {
    let mut d: Dict<u64, u64> = Dict::new();
    for i in 0..32 {
        d.add(i, i).unwrap();
    }
    while d.rehash(100) {}
    d.disable_resize();
    let size_before = d.table_size();

    // Writes keep landing while the dump runs, but the table stays put.
    let mut cursor = 0u64;
    let mut dumped = BTreeSet::new();
    let mut next_write = 100u64;
    loop {
        cursor = d.scan(cursor, |k, _| {
            dumped.insert(*k);
        });
        if cursor == 0 {
            break;
        }
        d.add(next_write, next_write).unwrap();
        next_write += 1;
    }
    for i in 0..32 {
        assert!(dumped.contains(&i));
    }
    assert_eq!(d.table_size(), size_before, "no growth during dump");

    d.enable_resize();
    while d.len() >= d.table_size() {
        d.add(next_write, next_write).unwrap();
        next_write += 1;
    }
    while d.rehash(100) {}
    assert!(d.table_size() > size_before);
}
