//! Voronoi style region carving.
//!
//! Every generator here shares one structure: a tile that belongs to the preserved path set is
//! kept solid before any distance is even measured, everything else is carved or kept by a
//! distance test against a centre or a seed point.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use rand_xorshift::XorShiftRng;

use crate::coordinates::GridPosition;
use crate::masks::CaveMask;
use crate::units::{Height, Width};
use crate::utils::{self, TileSet};

/// Distance from the grid edge that Voronoi seed points keep.
pub const SEED_MARGIN: f32 = 1.0;

/// Shape of the void carved around one Voronoi seed.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum CellShape {
    Circle,
    Square,
    Cross,
}

#[derive(PartialEq, Copy, Clone, Debug)]
pub struct ShapeWeights {
    pub circle: f32,
    pub square: f32,
    pub cross: f32,
}

impl Default for ShapeWeights {
    fn default() -> ShapeWeights {
        ShapeWeights { circle: 1.0, square: 1.0, cross: 1.0 }
    }
}

/// One seed of a Voronoi carve with its own jittered reach and shape.
#[derive(PartialEq, Copy, Clone, Debug)]
pub struct VoronoiSeed {
    pub x: f32,
    pub z: f32,
    pub threshold: f32,
    pub shape: CellShape,
}

impl VoronoiSeed {
    fn offset_to(&self, pos: GridPosition) -> (f32, f32) {
        ((pos.x as f32 - self.x).abs(), (pos.z as f32 - self.z).abs())
    }

    fn distance_squared(&self, pos: GridPosition) -> f32 {
        let (dx, dz) = self.offset_to(pos);
        dx * dx + dz * dz
    }

    fn covers(&self, pos: GridPosition, cross_arm_width: f32) -> bool {
        let (dx, dz) = self.offset_to(pos);
        let t = self.threshold;
        match self.shape {
            CellShape::Circle => (dx * dx + dz * dz).sqrt() <= t,
            CellShape::Square => dx.max(dz) <= t,
            CellShape::Cross => {
                // An arm is never thinner than the tile it crosses
                let arm = (t * cross_arm_width).max(0.5);
                (dx <= arm && dz <= t) || (dz <= arm && dx <= t)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegionCarver {
    width: Width,
    height: Height,
    rng: XorShiftRng,
}

impl RegionCarver {
    pub fn new(width: Width, height: Height, seed: u64) -> RegionCarver {
        RegionCarver {
            width,
            height,
            rng: utils::seeded_rng(seed),
        }
    }

    /// Uniformly random points within `[margin, width - margin) x [margin, height - margin)`.
    ///
    /// A margin too large for the grid collapses that axis onto the grid centre line.
    pub fn generate_seeds(&mut self, count: usize, margin: f32) -> Vec<(f32, f32)> {
        let (w, h) = (self.width.0 as f32, self.height.0 as f32);
        let mut seeds = Vec::with_capacity(count);
        for _ in 0..count {
            let x = self.sample_axis(margin, w - margin, w / 2.0);
            let z = self.sample_axis(margin, h - margin, h / 2.0);
            seeds.push((x, z));
        }
        seeds
    }

    fn sample_axis(&mut self, low: f32, high: f32, fallback: f32) -> f32 {
        if low < high {
            self.rng.gen_range(low..high)
        } else {
            fallback
        }
    }

    /// Chebyshev distance carving: every tile within `outer_size` of `centre` is carved, the ring
    /// `[inner_size, outer_size]` and the hollow core below `inner_size` alike.
    pub fn generate_square_caves(&self,
                                 inner_size: u32,
                                 outer_size: u32,
                                 centre: GridPosition,
                                 preserve_paths: bool,
                                 path_tiles: &TileSet)
                                 -> CaveMask {
        self.mask_preserving(preserve_paths, path_tiles, |pos| {
            let dx = (pos.x as i64 - centre.x as i64).abs();
            let dz = (pos.z as i64 - centre.z as i64).abs();
            let distance = dx.max(dz) as u32;
            (distance >= inner_size && distance <= outer_size) || distance < inner_size
        })
    }

    /// Euclidean distance variant of the square cave.
    pub fn generate_circular_caves(&self,
                                   inner_radius: f32,
                                   outer_radius: f32,
                                   centre: GridPosition,
                                   preserve_paths: bool,
                                   path_tiles: &TileSet)
                                   -> CaveMask {
        self.mask_preserving(preserve_paths, path_tiles, |pos| {
            let dx = pos.x as f32 - centre.x as f32;
            let dz = pos.z as f32 - centre.z as f32;
            let distance = (dx * dx + dz * dz).sqrt();
            (distance >= inner_radius && distance <= outer_radius) || distance < inner_radius
        })
    }

    /// Manhattan distance variant of the square cave.
    pub fn generate_diamond_caves(&self,
                                  inner_size: u32,
                                  outer_size: u32,
                                  centre: GridPosition,
                                  preserve_paths: bool,
                                  path_tiles: &TileSet)
                                  -> CaveMask {
        self.mask_preserving(preserve_paths, path_tiles, |pos| {
            let dx = (pos.x as i64 - centre.x as i64).abs();
            let dz = (pos.z as i64 - centre.z as i64).abs();
            let distance = (dx + dz) as u32;
            (distance >= inner_size && distance <= outer_size) || distance < inner_size
        })
    }

    /// Place `seed_count` seeds, give each a jittered threshold and a weighted random shape.
    pub fn generate_voronoi_seeds(&mut self,
                                  seed_count: usize,
                                  threshold: f32,
                                  variation: f32,
                                  weights: &ShapeWeights)
                                  -> Vec<VoronoiSeed> {
        let points = self.generate_seeds(seed_count, SEED_MARGIN);
        let shapes = [CellShape::Circle, CellShape::Square, CellShape::Cross];
        let shape_choice = WeightedIndex::new(&[weights.circle, weights.square, weights.cross]).ok();

        points.into_iter()
            .map(|(x, z)| {
                let jitter = if variation > 0.0 {
                    self.rng.gen_range(-variation..=variation)
                } else {
                    0.0
                };
                let shape = match shape_choice {
                    Some(ref choice) => shapes[choice.sample(&mut self.rng)],
                    None => CellShape::Circle,
                };
                VoronoiSeed {
                    x,
                    z,
                    threshold: (threshold * (1.0 + jitter)).max(0.0),
                    shape,
                }
            })
            .collect()
    }

    /// Voronoi cell carving: each tile belongs to its nearest seed and is carved if that seed's
    /// shape, at that seed's threshold, covers it.
    pub fn generate_voronoi_caves(&mut self,
                                  seed_count: usize,
                                  threshold: f32,
                                  variation: f32,
                                  weights: &ShapeWeights,
                                  cross_arm_width: f32,
                                  preserve_paths: bool,
                                  path_tiles: &TileSet)
                                  -> CaveMask {
        let seeds = self.generate_voronoi_seeds(seed_count, threshold, variation, weights);
        self.carve_voronoi_cells(&seeds, cross_arm_width, preserve_paths, path_tiles)
    }

    pub fn carve_voronoi_cells(&self,
                               seeds: &[VoronoiSeed],
                               cross_arm_width: f32,
                               preserve_paths: bool,
                               path_tiles: &TileSet)
                               -> CaveMask {
        self.mask_preserving(preserve_paths, path_tiles, |pos| {
            let nearest = seeds.iter().min_by(|a, b| {
                a.distance_squared(pos)
                    .partial_cmp(&b.distance_squared(pos))
                    .unwrap_or(::std::cmp::Ordering::Equal)
            });
            nearest.map_or(false, |seed| seed.covers(pos, cross_arm_width))
        })
    }

    fn mask_preserving<F>(&self, preserve_paths: bool, path_tiles: &TileSet, carve: F) -> CaveMask
        where F: Fn(GridPosition) -> bool
    {
        CaveMask::from_fn(self.width, self.height, |pos| {
            if preserve_paths && path_tiles.contains(&pos) {
                false
            } else {
                carve(pos)
            }
        })
    }
}


#[cfg(test)]
mod tests {

    use super::*;
    use quickcheck::quickcheck;

    fn carver(seed: u64) -> RegionCarver {
        RegionCarver::new(Width(13), Height(13), seed)
    }

    fn centre() -> GridPosition {
        GridPosition::new(6, 6)
    }

    #[test]
    fn seeds_respect_margin() {
        let mut c = carver(7);
        let seeds = c.generate_seeds(200, 2.0);
        assert_eq!(seeds.len(), 200);
        for (x, z) in seeds {
            assert!(x >= 2.0 && x < 11.0);
            assert!(z >= 2.0 && z < 11.0);
        }
    }

    #[test]
    fn oversized_margin_falls_back_to_centre() {
        let mut c = RegionCarver::new(Width(4), Height(4), 1);
        assert_eq!(c.generate_seeds(3, 5.0), vec![(2.0, 2.0); 3]);
    }

    #[test]
    fn seeds_are_deterministic() {
        assert_eq!(carver(99).generate_seeds(10, 1.0), carver(99).generate_seeds(10, 1.0));
    }

    #[test]
    fn square_cave_is_filled_square() {
        let c = carver(0);
        let mask = c.generate_square_caves(1, 2, centre(), false, &TileSet::default());
        assert_eq!(mask.carved_count(), 25);
        assert!(mask.is_carved(centre()));
        assert!(mask.is_carved(GridPosition::new(4, 4)));
        assert!(mask.is_carved(GridPosition::new(8, 8)));
        assert!(!mask.is_carved(GridPosition::new(3, 6)));
    }

    #[test]
    fn square_cave_keeps_path_tiles() {
        let c = carver(0);
        let path: TileSet = (0..13).map(|z| GridPosition::new(6, z)).collect();
        let mask = c.generate_square_caves(1, 2, centre(), true, &path);
        assert_eq!(mask.carved_count(), 20);
        for tile in &path {
            assert!(!mask.is_carved(*tile));
        }

        // preserve flag off ignores the path
        let mask = c.generate_square_caves(1, 2, centre(), false, &path);
        assert!(mask.is_carved(centre()));
    }

    #[test]
    fn circle_and_diamond_metrics() {
        let c = carver(0);
        let none = TileSet::default();
        let circle = c.generate_circular_caves(1.0, 2.0, centre(), false, &none);
        assert!(circle.is_carved(GridPosition::new(8, 6)));
        assert!(!circle.is_carved(GridPosition::new(8, 8)));

        let diamond = c.generate_diamond_caves(1, 2, centre(), false, &none);
        assert_eq!(diamond.carved_count(), 13);
        assert!(diamond.is_carved(GridPosition::new(7, 7)));
        assert!(!diamond.is_carved(GridPosition::new(8, 7)));
    }

    #[test]
    fn cross_shape_covers_arms_only() {
        let seed = VoronoiSeed { x: 6.0, z: 6.0, threshold: 3.0, shape: CellShape::Cross };
        assert!(seed.covers(GridPosition::new(9, 6), 0.2));
        assert!(seed.covers(GridPosition::new(6, 3), 0.2));
        assert!(!seed.covers(GridPosition::new(8, 8), 0.2));
        assert!(!seed.covers(GridPosition::new(10, 6), 0.2));
    }

    #[test]
    fn zero_weight_shapes_are_never_chosen() {
        let mut c = carver(3);
        let weights = ShapeWeights { circle: 0.0, square: 1.0, cross: 0.0 };
        let seeds = c.generate_voronoi_seeds(20, 3.0, 0.5, &weights);
        assert!(seeds.iter().all(|s| s.shape == CellShape::Square));
        assert!(seeds.iter().all(|s| s.threshold >= 1.5 && s.threshold <= 4.5));
    }

    #[test]
    fn voronoi_never_carves_preserved_tiles() {
        fn prop(seed: u64, path_xs: Vec<u8>) -> bool {
            let mut c = carver(seed);
            let path: TileSet = path_xs.iter()
                .enumerate()
                .map(|(z, x)| GridPosition::new(*x as u32 % 13, z as u32 % 13))
                .collect();
            let mask = c.generate_voronoi_caves(6, 3.0, 0.25, &ShapeWeights::default(), 0.35,
                                                true, &path);
            path.iter().all(|tile| !mask.is_carved(*tile))
        }
        quickcheck(prop as fn(u64, Vec<u8>) -> bool);
    }
}
