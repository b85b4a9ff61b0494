use std::fmt::Debug;

use crate::coordinates::{GridPosition, WorldPosition};
use crate::units::{Height, Width};

/// Opaque handle to one solid tile unit handed out by a `TileAllocator`.
#[derive(Hash, Eq, PartialEq, Copy, Clone, Debug, Ord, PartialOrd)]
pub struct TileHandle(pub u32);

/// Source of positionable tile units, e.g. an object pool in a host engine.
pub trait TileAllocator: Debug {
    fn acquire(&mut self) -> TileHandle;

    /// Return a unit to the free pool. Releasing a handle that was never acquired is undefined.
    fn release(&mut self, handle: TileHandle);
}

/// Free list backed allocator that recycles released handles.
#[derive(Debug, Default, Clone)]
pub struct TilePool {
    free: Vec<TileHandle>,
    next_handle: u32,
    acquired: usize,
    released: usize,
}

impl TilePool {
    pub fn new() -> TilePool {
        TilePool::default()
    }

    /// Total acquisitions over the pool's lifetime.
    pub fn acquired_count(&self) -> usize {
        self.acquired
    }

    pub fn released_count(&self) -> usize {
        self.released
    }

    /// Units currently handed out.
    pub fn live_count(&self) -> usize {
        self.acquired - self.released
    }

    /// Units waiting in the free list.
    pub fn free_count(&self) -> usize {
        self.free.len()
    }
}

impl TileAllocator for TilePool {
    fn acquire(&mut self) -> TileHandle {
        self.acquired += 1;
        self.free.pop().unwrap_or_else(|| {
            let handle = TileHandle(self.next_handle);
            self.next_handle += 1;
            handle
        })
    }

    fn release(&mut self, handle: TileHandle) {
        self.released += 1;
        self.free.push(handle);
    }
}

/// One layer of a module: a `width` * `height` grid of tile slots at a fixed vertical offset.
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    tiles: Vec<Option<TileHandle>>,
    pub width: Width,
    pub height: Height,
    pub y_offset: f32,
}

impl TileLayer {
    /// Fill every slot with a freshly acquired tile.
    pub fn solid(width: Width,
                 height: Height,
                 y_offset: f32,
                 allocator: &mut dyn TileAllocator)
                 -> TileLayer {
        let tiles = (0..width.0 * height.0)
            .map(|_| Some(allocator.acquire()))
            .collect();
        TileLayer {
            tiles,
            width,
            height,
            y_offset,
        }
    }

    #[inline]
    fn index(&self, pos: GridPosition) -> Option<usize> {
        if pos.is_within(self.width, self.height) {
            Some(pos.to_index(self.width))
        } else {
            None
        }
    }

    pub fn is_solid(&self, pos: GridPosition) -> bool {
        self.index(pos).map_or(false, |i| self.tiles[i].is_some())
    }

    /// Carve a tile, handing its unit back to the allocator.
    /// Returns true if the tile was solid before the call.
    pub fn clear(&mut self, pos: GridPosition, allocator: &mut dyn TileAllocator) -> bool {
        match self.index(pos).and_then(|i| self.tiles[i].take()) {
            Some(handle) => {
                allocator.release(handle);
                true
            }
            None => false,
        }
    }

    pub fn solid_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.is_some()).count()
    }

    pub fn cleared_count(&self) -> usize {
        self.tiles.len() - self.solid_count()
    }

    /// Row major iterator over the tiles that have been carved away.
    pub fn cleared_tiles<'a>(&'a self) -> impl Iterator<Item = GridPosition> + 'a {
        let width = self.width;
        self.tiles
            .iter()
            .enumerate()
            .filter(|&(_, t)| t.is_none())
            .map(move |(i, _)| GridPosition::from_index(i, width))
    }

    /// World placement of a tile relative to the module origin.
    pub fn world_position(&self,
                          origin: &WorldPosition,
                          spacing: f32,
                          pos: GridPosition)
                          -> WorldPosition {
        WorldPosition::new(origin.x + pos.x as f32 * spacing,
                           origin.y + self.y_offset,
                           origin.z + pos.z as f32 * spacing)
    }

    /// Give every remaining unit back, e.g. when a whole maze is discarded.
    pub fn release_all(&mut self, allocator: &mut dyn TileAllocator) {
        for slot in self.tiles.iter_mut() {
            if let Some(handle) = slot.take() {
                allocator.release(handle);
            }
        }
    }
}


#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn pool_recycles_released_handles() {
        let mut pool = TilePool::new();
        let a = pool.acquire();
        let b = pool.acquire();
        assert_ne!(a, b);
        pool.release(a);
        assert_eq!(pool.free_count(), 1);
        assert_eq!(pool.acquire(), a);
        assert_eq!(pool.acquired_count(), 3);
        assert_eq!(pool.live_count(), 2);
    }

    #[test]
    fn solid_layer_allocates_every_slot() {
        let mut pool = TilePool::new();
        let layer = TileLayer::solid(Width(4), Height(3), -1.0, &mut pool);
        assert_eq!(layer.solid_count(), 12);
        assert_eq!(pool.live_count(), 12);
    }

    #[test]
    fn clearing_releases_once() {
        let mut pool = TilePool::new();
        let mut layer = TileLayer::solid(Width(4), Height(3), 0.0, &mut pool);
        let p = GridPosition::new(1, 2);
        assert!(layer.clear(p, &mut pool));
        assert!(!layer.clear(p, &mut pool));
        assert!(!layer.clear(GridPosition::new(9, 9), &mut pool));
        assert!(!layer.is_solid(p));
        assert_eq!(pool.released_count(), 1);
        assert_eq!(layer.cleared_tiles().collect::<Vec<_>>(), vec![p]);
    }

    #[test]
    fn tile_world_positions() {
        let mut pool = TilePool::new();
        let layer = TileLayer::solid(Width(4), Height(3), -1.0, &mut pool);
        let origin = WorldPosition::new(10.0, 0.0, 20.0);
        let wp = layer.world_position(&origin, 1.5, GridPosition::new(2, 1));
        assert_eq!(wp, WorldPosition::new(13.0, -1.0, 21.5));
    }

    #[test]
    fn release_all_empties_layer() {
        let mut pool = TilePool::new();
        let mut layer = TileLayer::solid(Width(3), Height(3), 0.0, &mut pool);
        layer.clear(GridPosition::new(0, 0), &mut pool);
        layer.release_all(&mut pool);
        assert_eq!(layer.solid_count(), 0);
        assert_eq!(pool.live_count(), 0);
    }
}
