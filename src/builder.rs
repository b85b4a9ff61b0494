//! Materialises one module at a time: allocates its two tile layers, drives the main path walk
//! and the optional cave pass, then hands the finished module downstream.

use std::fmt;

use crate::carver::{RegionCarver, ShapeWeights};
use crate::collaborators::GeometryOptimizer;
use crate::config::{CaveStyle, MapConfig, CAVE_HOLLOW_SIZE};
use crate::coordinates::{Direction, GridPosition};
use crate::placement::ModuleDescriptor;
use crate::tiles::{TileAllocator, TileLayer};
use crate::units::{ModuleId, ModuleIndex, StepsCount};
use crate::utils::TileSet;
use crate::walker::{self, BranchPolicy, BranchRoute, PathWalker, StepResult, WalkOutcome};

/// Vertical offset of the layer the path is carved through.
pub const WALL_LAYER_OFFSET: f32 = 0.0;
/// Vertical offset of the always solid footing layer.
pub const FLOOR_LAYER_OFFSET: f32 = -1.0;

/// Lifecycle of a module from the moment its layers exist. No module ever goes back to an earlier
/// state. Branch carving walks keep a module in `PathCarving` (or `CaveCarving`) until they end.
#[derive(Eq, PartialEq, Copy, Clone, Debug, Ord, PartialOrd)]
pub enum ModuleState {
    Building,
    PathCarving,
    CaveCarving,
    Complete,
}

/// Everything known about one built module, the plain metadata record of the maze description.
#[derive(Debug, Clone)]
pub struct ModuleRecord {
    pub id: ModuleId,
    /// Build order among non-blockers. Blockers have none.
    pub index: Option<ModuleIndex>,
    pub descriptor: ModuleDescriptor,
    pub wall: TileLayer,
    pub floor: TileLayer,
    pub state: ModuleState,
    /// Main path tiles in carve order.
    pub path_tiles: Vec<GridPosition>,
    pub branches: Vec<BranchRoute>,
    /// Tiles opened by the cave pass that the path had not already opened.
    pub cave_tiles: Vec<GridPosition>,
    pub outcome: Option<WalkOutcome>,
    /// Moves made by the main path walk.
    pub steps: StepsCount,
    pub turned: bool,
    /// Seed of the module's private random stream.
    pub seed: u64,
}

impl ModuleRecord {
    pub fn is_blocker(&self) -> bool {
        self.descriptor.is_blocker
    }

    pub fn entry_direction(&self) -> Direction {
        self.descriptor.entry_direction
    }

    pub fn exit_direction(&self) -> Option<Direction> {
        match self.outcome {
            Some(WalkOutcome::Exited(exit)) => Some(exit.direction),
            _ => None,
        }
    }

    /// Tiles a cave pass must leave alone: the main path and every branch route.
    pub fn preserved_tiles(&self) -> TileSet {
        self.path_tiles
            .iter()
            .chain(self.branches.iter().flat_map(|b| b.tiles.iter()))
            .cloned()
            .collect()
    }

    pub fn is_branch_tile(&self, pos: GridPosition) -> bool {
        self.branches.iter().any(|b| b.tiles.contains(&pos))
    }
}

/// What one builder step did.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildEvent {
    /// No module is in progress.
    Idle,
    Carving(ModuleId),
    BranchSpawned { module: ModuleId, route: BranchRoute },
    /// The main walk and any cave pass are done. The module still waits on its branch walks
    /// before `finish` hands it on.
    PathFinished { module: ModuleId, outcome: WalkOutcome },
}

#[derive(Debug, Clone)]
struct ActiveBuild {
    module: ModuleId,
    walker: PathWalker,
}

#[derive(Debug, Clone, Default)]
pub struct ModuleBuilder {
    active: Option<ActiveBuild>,
    modules_built: usize,
    blockers_built: usize,
    caves_carved: usize,
}

impl ModuleBuilder {
    pub fn new() -> ModuleBuilder {
        ModuleBuilder::default()
    }

    /// Non-blocker modules whose main walk has ended.
    pub fn modules_built(&self) -> usize {
        self.modules_built
    }

    pub fn blockers_built(&self) -> usize {
        self.blockers_built
    }

    pub fn caves_carved(&self) -> usize {
        self.caves_carved
    }

    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    /// Allocate a module's layers and get its path walk ready.
    ///
    /// Blockers have no path, they come back already `Complete`.
    pub fn begin(&mut self,
                 id: ModuleId,
                 descriptor: ModuleDescriptor,
                 config: &MapConfig,
                 allocator: &mut dyn TileAllocator,
                 optimizer: &mut dyn GeometryOptimizer)
                 -> ModuleRecord {
        let (width, height) = (config.grid_width(), config.grid_height());
        let normalized = config.normalized_position(&descriptor.position);
        let seed = walker::walk_seed(config.seed, &normalized);
        let index = if descriptor.is_blocker {
            None
        } else {
            Some(ModuleIndex(self.modules_built))
        };

        let mut record = ModuleRecord {
            id,
            index,
            wall: TileLayer::solid(width, height, WALL_LAYER_OFFSET, allocator),
            floor: TileLayer::solid(width, height, FLOOR_LAYER_OFFSET, allocator),
            descriptor,
            state: ModuleState::Building,
            path_tiles: Vec::new(),
            branches: Vec::new(),
            cave_tiles: Vec::new(),
            outcome: None,
            steps: StepsCount(0),
            turned: false,
            seed,
        };

        match index {
            None => {
                log::debug!("blocker {} sealing {}", id.0, record.descriptor.position);
                self.blockers_built += 1;
                self.finish(&mut record, optimizer);
            }
            Some(index) => {
                let policy = BranchPolicy::for_module(index, config.branching_active(index.0));
                let walker = PathWalker::main_path(width,
                                                   height,
                                                   record.descriptor.entry_tile,
                                                   record.descriptor.entry_direction,
                                                   seed,
                                                   policy);
                log::debug!("module {} (index {}) at {} entering {} at {:?}",
                            id.0,
                            index.0,
                            record.descriptor.position,
                            record.descriptor.entry_direction,
                            record.descriptor.entry_tile);
                record.state = ModuleState::PathCarving;
                self.active = Some(ActiveBuild { module: id, walker });
            }
        }
        record
    }

    /// Advance the module in progress by one tile-step.
    pub fn step(&mut self,
                modules: &mut [ModuleRecord],
                config: &MapConfig,
                allocator: &mut dyn TileAllocator)
                -> BuildEvent {
        let active = match self.active {
            Some(ref mut active) => active,
            None => return BuildEvent::Idle,
        };
        let module = active.module;

        match active.walker.step(&mut modules[module.0].wall, allocator) {
            StepResult::Continue => BuildEvent::Carving(module),
            StepResult::Spawned(route) => {
                modules[module.0].branches.push(route.clone());
                BuildEvent::BranchSpawned { module, route }
            }
            StepResult::Finished(outcome) => {
                let record = &mut modules[module.0];
                record.path_tiles = active.walker.carved().to_vec();
                record.turned = active.walker.turned();
                record.steps = active.walker.steps();
                record.outcome = Some(outcome);
                self.active = None;

                let cave_module = record.index.map_or(false, |i| config.is_cave_module(i.0));
                if cave_module {
                    if let WalkOutcome::Exited(_) = outcome {
                        record.state = ModuleState::CaveCarving;
                        self.carve_cave(record, config, allocator);
                    }
                }

                self.modules_built += 1;
                BuildEvent::PathFinished { module, outcome }
            }
        }
    }

    /// One cave pass over the finished path, leaving every path and branch tile solid in the mask.
    fn carve_cave(&mut self,
                  record: &mut ModuleRecord,
                  config: &MapConfig,
                  allocator: &mut dyn TileAllocator) {
        let (width, height) = (config.grid_width(), config.grid_height());
        let preserved = record.preserved_tiles();
        let voronoi = &config.voronoi;
        let mut carver = RegionCarver::new(width, height, record.seed);

        let mask = match voronoi.style {
            CaveStyle::Square => {
                carver.generate_square_caves(CAVE_HOLLOW_SIZE,
                                             voronoi.threshold.round().max(0.0) as u32,
                                             GridPosition::centre(width, height),
                                             true,
                                             &preserved)
            }
            CaveStyle::Voronoi => {
                let weights = ShapeWeights {
                    circle: voronoi.circle_weight,
                    square: voronoi.square_weight,
                    cross: voronoi.cross_weight,
                };
                carver.generate_voronoi_caves(voronoi.seed_count,
                                              voronoi.threshold,
                                              voronoi.variation,
                                              &weights,
                                              voronoi.cross_arm_width,
                                              true,
                                              &preserved)
            }
        };

        for tile in mask.carved_tiles() {
            if record.wall.clear(tile, allocator) {
                record.cave_tiles.push(tile);
            }
        }
        self.caves_carved += 1;
        log::debug!("cave pass on module {} opened {} tiles", record.id.0, record.cave_tiles.len());
    }

    /// Mark a module whose carving is all done as `Complete` and hand it to the optimizer.
    pub fn finish(&mut self, record: &mut ModuleRecord, optimizer: &mut dyn GeometryOptimizer) {
        record.state = ModuleState::Complete;
        log::debug!("module {} complete, {} tiles cleared", record.id.0, record.wall.cleared_count());
        optimizer.optimize(record);
    }
}

impl fmt::Display for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            ModuleState::Building => "building",
            ModuleState::PathCarving => "path carving",
            ModuleState::CaveCarving => "cave carving",
            ModuleState::Complete => "complete",
        };
        write!(f, "{}", name)
    }
}


#[cfg(test)]
mod tests {

    use super::*;
    use crate::collaborators::NoopOptimizer;
    use crate::coordinates::WorldPosition;
    use crate::placement::Lineage;
    use crate::tiles::TilePool;

    #[derive(Debug, Default)]
    struct CountingOptimizer {
        seen: Vec<(ModuleId, ModuleState)>,
    }

    impl GeometryOptimizer for CountingOptimizer {
        fn optimize(&mut self, module: &ModuleRecord) {
            self.seen.push((module.id, module.state));
        }
    }

    fn first_descriptor(config: &MapConfig) -> ModuleDescriptor {
        ModuleDescriptor::initial(WorldPosition::ORIGIN,
                                  GridPosition::centre(config.grid_width(), config.grid_height()))
    }

    fn build_one(config: &MapConfig,
                 descriptor: ModuleDescriptor)
                 -> (ModuleBuilder, Vec<ModuleRecord>, Vec<BuildEvent>, TilePool) {
        let mut pool = TilePool::new();
        let mut optimizer = NoopOptimizer;
        let mut builder = ModuleBuilder::new();
        let record = builder.begin(ModuleId(0), descriptor, config, &mut pool, &mut optimizer);
        let mut modules = vec![record];
        let mut events = Vec::new();
        loop {
            let event = builder.step(&mut modules, config, &mut pool);
            match event {
                BuildEvent::Idle => break,
                BuildEvent::PathFinished { .. } => builder.finish(&mut modules[0], &mut optimizer),
                _ => {}
            }
            events.push(event);
        }
        (builder, modules, events, pool)
    }

    #[test]
    fn blocker_is_complete_and_solid() {
        let config = MapConfig::default();
        let mut pool = TilePool::new();
        let mut optimizer = CountingOptimizer::default();
        let mut builder = ModuleBuilder::new();
        let mut d = first_descriptor(&config);
        d.is_blocker = true;
        let record = builder.begin(ModuleId(4), d, &config, &mut pool, &mut optimizer);
        assert_eq!(record.state, ModuleState::Complete);
        assert_eq!(record.index, None);
        assert_eq!(record.wall.solid_count(), 169);
        assert_eq!(record.floor.solid_count(), 169);
        assert!(!builder.is_busy());
        assert_eq!(builder.blockers_built(), 1);
        assert_eq!(builder.modules_built(), 0);
        assert_eq!(optimizer.seen, vec![(ModuleId(4), ModuleState::Complete)]);
    }

    #[test]
    fn path_end_leaves_the_module_for_finish() {
        let mut config = MapConfig::default();
        config.branching = Some(0);
        let mut pool = TilePool::new();
        let mut optimizer = CountingOptimizer::default();
        let mut builder = ModuleBuilder::new();
        let record = builder.begin(ModuleId(0), first_descriptor(&config), &config, &mut pool,
                                   &mut optimizer);
        let mut modules = vec![record];
        loop {
            match builder.step(&mut modules, &config, &mut pool) {
                BuildEvent::PathFinished { .. } => break,
                BuildEvent::Idle => panic!("walk ended without reporting"),
                _ => {}
            }
        }
        assert_eq!(modules[0].state, ModuleState::PathCarving);
        assert_eq!(builder.modules_built(), 1);
        assert!(optimizer.seen.is_empty());

        builder.finish(&mut modules[0], &mut optimizer);
        assert_eq!(modules[0].state, ModuleState::Complete);
        assert_eq!(optimizer.seen, vec![(ModuleId(0), ModuleState::Complete)]);
        assert_eq!(builder.modules_built(), 1);
    }

    #[test]
    fn builds_two_layers_and_carves_only_the_wall() {
        let config = MapConfig::default();
        let (builder, modules, events, pool) = build_one(&config, first_descriptor(&config));
        let m = &modules[0];
        assert_eq!(m.state, ModuleState::Complete);
        assert_eq!(m.index, Some(ModuleIndex(0)));
        assert_eq!(m.floor.solid_count(), 169);
        assert_eq!(m.wall.cleared_count(), m.path_tiles.len());
        assert_eq!(m.wall.y_offset, WALL_LAYER_OFFSET);
        assert_eq!(m.floor.y_offset, FLOOR_LAYER_OFFSET);
        assert_eq!(builder.modules_built(), 1);
        assert_eq!(pool.live_count(), 2 * 169 - m.path_tiles.len());
        match events.last() {
            Some(&BuildEvent::PathFinished { module, outcome: WalkOutcome::Exited(exit) }) => {
                assert_eq!(module, ModuleId(0));
                assert_eq!(exit.tile, GridPosition::new(6, 12));
            }
            other => panic!("unexpected last event {:?}", other),
        }
    }

    #[test]
    fn first_module_branch_is_reported_and_recorded() {
        let mut config = MapConfig::default();
        config.branching = Some(0);
        let (_, modules, events, _) = build_one(&config, first_descriptor(&config));
        let spawned: Vec<_> = events.iter()
            .filter(|e| match **e {
                BuildEvent::BranchSpawned { .. } => true,
                _ => false,
            })
            .collect();
        assert_eq!(spawned.len(), 1);
        assert_eq!(modules[0].branches.len(), 1);
        assert!(modules[0].is_branch_tile(GridPosition::new(6, 7)));
    }

    #[test]
    fn cave_pass_preserves_path_and_opens_around_centre() {
        let mut config = MapConfig::default();
        config.voronoi.enabled = true;
        config.voronoi.threshold = 3.0;
        let (builder, modules, _, _) = build_one(&config, first_descriptor(&config));
        let m = &modules[0];
        assert_eq!(builder.caves_carved(), 1);
        assert!(!m.cave_tiles.is_empty());
        // a 7x7 square around the centre minus the path column through it
        assert_eq!(m.cave_tiles.len(), 49 - 4);
        for tile in &m.cave_tiles {
            assert!(!m.path_tiles.contains(tile));
        }
        assert_eq!(m.wall.cleared_count(), m.path_tiles.len() + m.cave_tiles.len());
    }

    #[test]
    fn voronoi_style_cave_pass_runs() {
        let mut config = MapConfig::default();
        config.voronoi.enabled = true;
        config.voronoi.style = CaveStyle::Voronoi;
        let (builder, modules, _, _) = build_one(&config, first_descriptor(&config));
        assert_eq!(builder.caves_carved(), 1);
        let preserved = modules[0].preserved_tiles();
        assert!(modules[0].cave_tiles.iter().all(|t| !preserved.contains(t)));
    }

    #[test]
    fn branch_lineage_descriptor_builds_like_any_other() {
        let config = MapConfig::default();
        let d = ModuleDescriptor {
            position: WorldPosition::new(15.6, 0.0, 0.0),
            entry_direction: Direction::Right,
            entry_tile: GridPosition::new(0, 6),
            is_blocker: false,
            lineage: Lineage::Branch,
            parent: Some(ModuleId(0)),
        };
        let (_, modules, _, _) = build_one(&config, d);
        assert_eq!(modules[0].path_tiles[0], GridPosition::new(0, 6));
        assert!(modules[0].exit_direction() != Some(Direction::Left));
    }
}
