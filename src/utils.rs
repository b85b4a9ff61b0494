use fnv::FnvHasher;
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;
use std::{
    collections::HashSet,
    hash::{BuildHasherDefault, Hash}
};

use crate::coordinates::GridPosition;

pub type FnvHashSet<T> = HashSet<T, BuildHasherDefault<FnvHasher>>;

/// Set of module local tiles, e.g. the tiles visited by one path run.
pub type TileSet = FnvHashSet<GridPosition>;

/// Construct a hash set with the specified capacity. FNV is much faster than the default hasher
/// on short keys such as grid positions.
pub fn fnv_hashset<T: Hash + Eq>(capacity: usize) -> FnvHashSet<T> {
    let fnv = BuildHasherDefault::<FnvHasher>::default();
    HashSet::<T, _>::with_capacity_and_hasher(capacity, fnv)
}

/// The one random stream type used everywhere in generation. Same seed, same stream.
pub fn seeded_rng(seed: u64) -> XorShiftRng {
    XorShiftRng::seed_from_u64(seed)
}
