//! Whole-maze generation: the placement queue, the module builder and the branch carving walks
//! driven together, one tick at a time.

use petgraph::graph::NodeIndex;
use petgraph::Graph;

use crate::builder::{BuildEvent, ModuleBuilder, ModuleRecord};
use crate::collaborators::{GeometryOptimizer, InstantPacing, NoopOptimizer, PacingController};
use crate::config::MapConfig;
use crate::coordinates::{Direction, GridPosition, WorldPosition};
use crate::errors::*;
use crate::placement::{Lineage, ModuleDescriptor, ModulePlacementQueue};
use crate::tiles::{TileAllocator, TilePool};
use crate::units::{ModuleId, ModuleIndex};
use crate::walker::{AbortReason, BranchRoute, Exit, PathWalker, StepResult, WalkOutcome};

/// Modules as nodes, parent to child edges weighted with the heading the path crossed in on.
pub type ModuleGraph = Graph<ModuleId, Direction>;

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum GenerationStatus {
    /// More ticks are needed.
    Working,
    /// Waiting for the pacing controller to allow another tick.
    Suspended,
    Finished,
}

#[derive(Eq, PartialEq, Copy, Clone, Debug, Default)]
pub struct GenerationStats {
    pub modules_built: usize,
    pub blockers_built: usize,
    pub rejected_placements: usize,
    pub overlap_aborts: usize,
    pub step_budget_aborts: usize,
    pub branches_spawned: usize,
    pub caves_carved: usize,
    /// Descriptors still queued when the budget ran out.
    pub unbuilt_descriptors: usize,
    pub ticks: usize,
}

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
enum Phase {
    NotStarted,
    /// Modules are still being taken from the queue.
    Building,
    /// No more modules will be built, branch carving walks are finishing.
    Draining,
    Finished,
}

#[derive(Debug)]
struct BranchWalk {
    module: ModuleId,
    walker: PathWalker,
}

/// Drives a maze from its first module to the last blocker.
#[derive(Debug)]
pub struct MapOrchestrator {
    config: MapConfig,
    queue: ModulePlacementQueue,
    builder: ModuleBuilder,
    modules: Vec<ModuleRecord>,
    branch_walks: Vec<BranchWalk>,
    graph: ModuleGraph,
    next_position: WorldPosition,
    last_exit: Option<Exit>,
    allocator: Box<dyn TileAllocator>,
    pacing: Box<dyn PacingController>,
    optimizer: Box<dyn GeometryOptimizer>,
    stats: GenerationStats,
    phase: Phase,
}

impl MapOrchestrator {
    /// An orchestrator with a private tile pool that runs straight through.
    pub fn new(config: MapConfig) -> Result<MapOrchestrator> {
        MapOrchestrator::with_collaborators(config,
                                            Box::new(TilePool::new()),
                                            Box::new(InstantPacing),
                                            Box::new(NoopOptimizer))
    }

    pub fn with_collaborators(config: MapConfig,
                              allocator: Box<dyn TileAllocator>,
                              pacing: Box<dyn PacingController>,
                              optimizer: Box<dyn GeometryOptimizer>)
                              -> Result<MapOrchestrator> {
        config.validate()?;
        Ok(MapOrchestrator {
            queue: ModulePlacementQueue::new(config.min_module_distance()),
            config,
            builder: ModuleBuilder::new(),
            modules: Vec::new(),
            branch_walks: Vec::new(),
            graph: ModuleGraph::new(),
            next_position: WorldPosition::ORIGIN,
            last_exit: None,
            allocator,
            pacing,
            optimizer,
            stats: GenerationStats::default(),
            phase: Phase::NotStarted,
        })
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn modules(&self) -> &[ModuleRecord] {
        &self.modules
    }

    pub fn graph(&self) -> &ModuleGraph {
        &self.graph
    }

    pub fn queue(&self) -> &ModulePlacementQueue {
        &self.queue
    }

    /// Position of the latest module accepted onto the main chain.
    pub fn next_position(&self) -> WorldPosition {
        self.next_position
    }

    /// Exit that produced the latest main chain placement.
    pub fn last_exit(&self) -> Option<Exit> {
        self.last_exit
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub fn stats(&self) -> GenerationStats {
        GenerationStats {
            modules_built: self.builder.modules_built(),
            blockers_built: self.builder.blockers_built(),
            rejected_placements: self.queue.rejected_count(),
            caves_carved: self.builder.caves_carved(),
            ..self.stats
        }
    }

    /// Turn an exit into the descriptor of the neighbouring module and offer it to the queue.
    ///
    /// Without a `base_position` the candidate is placed next to the latest main chain module and,
    /// if accepted, becomes the new main chain cursor. With one, the candidate is placed next to
    /// that position and the cursor is left alone. Returns whether the candidate was accepted.
    pub fn decide_next_module_position(&mut self,
                                       exit_x: u32,
                                       exit_z: u32,
                                       exit_direction: Direction,
                                       base_position: Option<WorldPosition>,
                                       is_blocker: bool,
                                       parent: Option<ModuleId>)
                                       -> bool {
        let (offset_x, offset_z) = self.config.module_offsets();
        let base = base_position.unwrap_or(self.next_position);
        let exit_tile = GridPosition::new(exit_x, exit_z);

        let descriptor = ModuleDescriptor {
            position: base.stepped(exit_direction, offset_x, offset_z),
            entry_direction: exit_direction,
            entry_tile: exit_tile.next_module_entry(exit_direction, self.config.grid_width()),
            is_blocker,
            lineage: if base_position.is_some() { Lineage::Branch } else { Lineage::Main },
            parent,
        };
        let position = descriptor.position;

        let accepted = self.queue.enqueue(descriptor);
        if accepted && base_position.is_none() {
            self.next_position = position;
            self.last_exit = Some(Exit { tile: exit_tile, direction: exit_direction });
        }
        accepted
    }

    /// Let the pacing controller allow `steps` more ticks. Only matters in manual advance mode.
    pub fn signal_advance(&mut self, steps: usize) {
        self.pacing.signal(steps);
    }

    /// Advance generation by at most one tick, as far as the pacing controller allows.
    pub fn step(&mut self) -> GenerationStatus {
        match self.phase {
            Phase::Finished => return GenerationStatus::Finished,
            Phase::NotStarted => self.start(),
            Phase::Building | Phase::Draining => {}
        }

        if self.pacing.manual_advance_mode() && !self.pacing.take_advance() {
            return GenerationStatus::Suspended;
        }

        self.tick();

        if self.phase == Phase::Draining && self.branch_walks.is_empty() {
            self.finish();
            GenerationStatus::Finished
        } else {
            GenerationStatus::Working
        }
    }

    /// Run to the end in instant mode, otherwise a single step.
    pub fn run(&mut self) -> GenerationStatus {
        if !self.pacing.instant_mode() {
            return self.step();
        }
        loop {
            match self.step() {
                GenerationStatus::Working => {}
                status => return status,
            }
        }
    }

    /// Throw away everything built so far, handing every tile back to the allocator.
    pub fn reset(&mut self) {
        for module in self.modules.iter_mut() {
            module.wall.release_all(&mut *self.allocator);
            module.floor.release_all(&mut *self.allocator);
        }
        self.modules.clear();
        self.branch_walks.clear();
        self.graph.clear();
        self.queue.clear();
        self.builder = ModuleBuilder::new();
        self.next_position = WorldPosition::ORIGIN;
        self.last_exit = None;
        self.stats = GenerationStats::default();
        self.phase = Phase::NotStarted;
    }

    /// The finished description of the maze.
    pub fn into_maze(self) -> Maze {
        let stats = self.stats();
        Maze {
            placements: self.queue.claimed_positions().to_vec(),
            config: self.config,
            modules: self.modules,
            graph: self.graph,
            stats,
        }
    }

    fn start(&mut self) {
        let centre = GridPosition::centre(self.config.grid_width(), self.config.grid_height());
        self.queue.enqueue(ModuleDescriptor::initial(WorldPosition::ORIGIN, centre));
        self.next_position = WorldPosition::ORIGIN;
        self.phase = Phase::Building;
        log::info!("generating up to {} modules of {}x{} tiles, seed {}",
                   self.config.module_count,
                   self.config.width,
                   self.config.height,
                   self.config.seed);
    }

    fn tick(&mut self) {
        self.stats.ticks += 1;
        if self.phase == Phase::Building {
            if self.builder.is_busy() {
                self.advance_module();
            } else {
                self.start_next_module();
            }
        }
        self.advance_branch_walks();
    }

    fn start_next_module(&mut self) {
        // Past the budget only blockers are still built, they seal exits already queued.
        let next = if self.builder.modules_built() < self.config.module_count {
            self.queue.dequeue()
        } else {
            match self.queue.peek() {
                Some(d) if d.is_blocker => self.queue.dequeue(),
                _ => None,
            }
        };

        match next {
            Some(descriptor) => self.build(descriptor),
            None => {
                self.stats.unbuilt_descriptors = self.queue.count();
                if self.queue.count() > 0 {
                    log::debug!("module budget spent with {} descriptors still queued",
                                self.queue.count());
                }
                self.phase = Phase::Draining;
            }
        }
    }

    fn build(&mut self, descriptor: ModuleDescriptor) {
        let id = ModuleId(self.modules.len());
        let parent = descriptor.parent;
        let entry_direction = descriptor.entry_direction;

        let record = self.builder.begin(id,
                                        descriptor,
                                        &self.config,
                                        &mut *self.allocator,
                                        &mut *self.optimizer);
        let node = self.graph.add_node(id);
        if let Some(parent) = parent {
            self.graph.add_edge(NodeIndex::new(parent.0), node, entry_direction);
        }
        self.modules.push(record);
    }

    fn advance_module(&mut self) {
        let event = self.builder.step(&mut self.modules, &self.config, &mut *self.allocator);
        match event {
            BuildEvent::Idle | BuildEvent::Carving(_) => {}
            BuildEvent::BranchSpawned { module, route } => self.spawn_branch(module, route),
            BuildEvent::PathFinished { module, outcome } => {
                self.module_completed(module, outcome);
                self.finish_if_carved(module);
            }
        }
    }

    /// Hand a module on once its main walk has ended and no branch walk is still carving it.
    fn finish_if_carved(&mut self, module: ModuleId) {
        if self.modules[module.0].outcome.is_none() ||
           self.branch_walks.iter().any(|w| w.module == module) {
            return;
        }
        self.builder.finish(&mut self.modules[module.0], &mut *self.optimizer);
    }

    fn within_budget(&self, index: Option<ModuleIndex>) -> bool {
        index.map_or(false, |i| i.0 + 1 < self.config.module_count)
    }

    fn spawn_branch(&mut self, module: ModuleId, route: BranchRoute) {
        let (position, index, seed) = {
            let record = &self.modules[module.0];
            (record.descriptor.position, record.index, record.seed)
        };
        let blocker = !self.within_budget(index);
        self.stats.branches_spawned += 1;

        self.decide_next_module_position(route.exit.tile.x,
                                         route.exit.tile.z,
                                         route.exit.direction,
                                         Some(position),
                                         blocker,
                                         Some(module));

        let walker = PathWalker::branch(self.config.grid_width(),
                                        self.config.grid_height(),
                                        &route,
                                        seed);
        self.branch_walks.push(BranchWalk { module, walker });
    }

    fn module_completed(&mut self, module: ModuleId, outcome: WalkOutcome) {
        match outcome {
            WalkOutcome::Exited(exit) => {
                let (lineage, position, index) = {
                    let record = &self.modules[module.0];
                    (record.descriptor.lineage, record.descriptor.position, record.index)
                };
                let base = match lineage {
                    Lineage::Main => None,
                    Lineage::Branch => Some(position),
                };
                let blocker = !self.within_budget(index);
                self.decide_next_module_position(exit.tile.x,
                                                 exit.tile.z,
                                                 exit.direction,
                                                 base,
                                                 blocker,
                                                 Some(module));
            }
            WalkOutcome::Aborted(AbortReason::Overlap(_)) => self.stats.overlap_aborts += 1,
            WalkOutcome::Aborted(AbortReason::StepBudget) => self.stats.step_budget_aborts += 1,
        }
    }

    fn advance_branch_walks(&mut self) {
        let mut i = 0;
        while i < self.branch_walks.len() {
            let finished = {
                let task = &mut self.branch_walks[i];
                let record = &mut self.modules[task.module.0];
                match task.walker.step(&mut record.wall, &mut *self.allocator) {
                    StepResult::Finished(outcome) => Some((task.module, outcome)),
                    StepResult::Continue | StepResult::Spawned(_) => None,
                }
            };
            match finished {
                Some((module, outcome)) => {
                    log::trace!("branch walk of module {} done: {:?}", module.0, outcome);
                    self.branch_walks.remove(i);
                    self.finish_if_carved(module);
                }
                None => i += 1,
            }
        }
    }

    fn finish(&mut self) {
        self.phase = Phase::Finished;
        let stats = self.stats();
        log::info!("maze finished: {} modules, {} blockers, {} branches, {} caves in {} ticks",
                   stats.modules_built,
                   stats.blockers_built,
                   stats.branches_spawned,
                   stats.caves_carved,
                   stats.ticks);
        if stats.overlap_aborts + stats.step_budget_aborts > 0 {
            log::warn!("{} module paths ended without an exit",
                       stats.overlap_aborts + stats.step_budget_aborts);
        }
    }
}

/// A finished maze: every module in build order plus how they connect.
#[derive(Debug, Clone)]
pub struct Maze {
    config: MapConfig,
    modules: Vec<ModuleRecord>,
    graph: ModuleGraph,
    stats: GenerationStats,
    placements: Vec<WorldPosition>,
}

impl Maze {
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn modules(&self) -> &[ModuleRecord] {
        &self.modules
    }

    pub fn module(&self, id: ModuleId) -> Result<&ModuleRecord> {
        self.modules.get(id.0).ok_or_else(|| ErrorKind::UnknownModule(id.0).into())
    }

    pub fn graph(&self) -> &ModuleGraph {
        &self.graph
    }

    pub fn stats(&self) -> &GenerationStats {
        &self.stats
    }

    /// Every accepted placement, built or not, in acceptance order.
    pub fn placements(&self) -> &[WorldPosition] {
        &self.placements
    }

    /// Modules that were not blockers.
    pub fn path_modules<'a>(&'a self) -> impl Iterator<Item = &'a ModuleRecord> + 'a {
        self.modules.iter().filter(|m| !m.is_blocker())
    }
}

/// Build a whole maze in one go.
pub fn generate(config: MapConfig) -> Result<Maze> {
    let mut orchestrator = MapOrchestrator::new(config)?;
    orchestrator.run();
    Ok(orchestrator.into_maze())
}
