//! Pending module work and the world positions already claimed by accepted modules.

use std::collections::VecDeque;

use crate::coordinates::{Direction, GridPosition, WorldPosition};
use crate::units::ModuleId;

/// Which chain of modules a descriptor continues.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum Lineage {
    /// The chain grown from the first module. Its placements move the orchestrator's cursor.
    Main,
    /// A chain started by a branch. Placed relative to the module that spawned it.
    Branch,
}

/// The unit of work queued for building.
#[derive(PartialEq, Clone, Debug)]
pub struct ModuleDescriptor {
    pub position: WorldPosition,
    /// Heading of the path as it enters the module.
    pub entry_direction: Direction,
    pub entry_tile: GridPosition,
    /// Fully solid module without a path, sealing an exit once the budget is spent.
    pub is_blocker: bool,
    pub lineage: Lineage,
    /// The module whose exit produced this descriptor.
    pub parent: Option<ModuleId>,
}

impl ModuleDescriptor {
    /// The first module: entered at the grid centre, heading down.
    pub fn initial(position: WorldPosition, entry_tile: GridPosition) -> ModuleDescriptor {
        ModuleDescriptor {
            position,
            entry_direction: Direction::Down,
            entry_tile,
            is_blocker: false,
            lineage: Lineage::Main,
            parent: None,
        }
    }
}

/// FIFO of descriptors plus the set of claimed world positions.
///
/// Collision avoidance is deliberately coarse: modules are treated as points and a candidate
/// closer than `min_distance` to any accepted position is dropped.
#[derive(Debug, Clone)]
pub struct ModulePlacementQueue {
    pending: VecDeque<ModuleDescriptor>,
    claimed: Vec<WorldPosition>,
    min_distance: f32,
    rejected: usize,
}

impl ModulePlacementQueue {
    pub fn new(min_distance: f32) -> ModulePlacementQueue {
        ModulePlacementQueue {
            pending: VecDeque::new(),
            claimed: Vec::new(),
            min_distance,
            rejected: 0,
        }
    }

    /// Is `position` free to be claimed?
    pub fn is_free(&self, position: &WorldPosition) -> bool {
        !self.claimed
            .iter()
            .any(|c| c == position || c.distance(position) < self.min_distance)
    }

    /// Queue a descriptor unless its position is already taken or too close to a taken one.
    /// Returns whether the descriptor was accepted.
    pub fn enqueue(&mut self, descriptor: ModuleDescriptor) -> bool {
        if !self.is_free(&descriptor.position) {
            self.rejected += 1;
            log::debug!("placement at {} rejected, too close to an existing module",
                        descriptor.position);
            return false;
        }

        log::debug!("placement at {} accepted ({})",
                    descriptor.position,
                    if descriptor.is_blocker { "blocker" } else { "module" });
        self.claimed.push(descriptor.position);
        self.pending.push_back(descriptor);
        true
    }

    pub fn dequeue(&mut self) -> Option<ModuleDescriptor> {
        self.pending.pop_front()
    }

    pub fn peek(&self) -> Option<&ModuleDescriptor> {
        self.pending.front()
    }

    pub fn count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Forget every pending descriptor and every claimed position.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.claimed.clear();
        self.rejected = 0;
    }

    /// Accepted positions in acceptance order.
    pub fn claimed_positions(&self) -> &[WorldPosition] {
        &self.claimed
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected
    }

    pub fn min_distance(&self) -> f32 {
        self.min_distance
    }
}
