use bit_set::BitSet;

use crate::coordinates::GridPosition;
use crate::units::{Height, Width};

/// Carve mask over one module grid. A set bit means "carve this tile", a clear bit "leave solid".
#[derive(Debug, Clone, PartialEq)]
pub struct CaveMask {
    mask: BitSet,
    pub width: Width,
    pub height: Height,
}

impl CaveMask {
    /// A mask with nothing marked for carving.
    pub fn new(width: Width, height: Height) -> CaveMask {
        CaveMask {
            mask: BitSet::with_capacity(width.0 * height.0),
            width,
            height,
        }
    }

    /// Build a mask by asking `carve` about every tile in row major order.
    pub fn from_fn<F>(width: Width, height: Height, mut carve: F) -> CaveMask
        where F: FnMut(GridPosition) -> bool
    {
        let mut cave_mask = CaveMask::new(width, height);
        for z in 0..height.0 {
            for x in 0..width.0 {
                let pos = GridPosition::new(x as u32, z as u32);
                if carve(pos) {
                    cave_mask.mask.insert(pos.to_index(width));
                }
            }
        }
        cave_mask
    }

    /// Is the given tile marked for carving?
    ///
    /// A tile outside the bounds of the mask is never carved.
    pub fn is_carved(&self, pos: GridPosition) -> bool {
        if pos.is_within(self.width, self.height) {
            self.mask.contains(pos.to_index(self.width))
        } else {
            false
        }
    }

    pub fn carved_count(&self) -> usize {
        self.mask.len()
    }

    /// Carved tiles in row major order.
    pub fn carved_tiles<'a>(&'a self) -> impl Iterator<Item = GridPosition> + 'a {
        let width = self.width;
        self.mask.iter().map(move |index| GridPosition::from_index(index, width))
    }
}
