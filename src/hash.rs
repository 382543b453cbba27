//! Integer mixing and sizing helpers shared by the dictionary internals.

/// Minimum allocated table size. Tables round capacities up to the next
/// power of two, never below this.
pub const MIN_TABLE_SIZE: usize = 4;

/// Round `size` up to the next power of two, clamped to `MIN_TABLE_SIZE`.
pub(crate) fn next_table_size(size: usize) -> usize {
    size.next_power_of_two().max(MIN_TABLE_SIZE)
}

/// Thomas Wang's 64-bit integer mix. Used to fold structural integers
/// into the iterator fingerprint so that the same integers in a different
/// order (very likely) produce a different result.
pub(crate) fn mix64(mut h: u64) -> u64 {
    h = (!h).wrapping_add(h << 21);
    h ^= h >> 24;
    h = h.wrapping_add(h << 3).wrapping_add(h << 8);
    h ^= h >> 14;
    h = h.wrapping_add(h << 2).wrapping_add(h << 4);
    h ^= h >> 28;
    h.wrapping_add(h << 31)
}

/// SplitMix64 step. Backs `Dict::random_entry`; seeded from `DictConfig`
/// so selection is reproducible for a given seed.
pub(crate) fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
