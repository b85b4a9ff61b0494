//! Path carving through one module grid.
//!
//! A walk is a resumable task: every call to `PathWalker::step` carves exactly one tile and
//! reports whether more work remains, so a scheduler can interleave the main path of a module
//! with the carving of branches spawned earlier.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use rand_xorshift::XorShiftRng;
use smallvec::SmallVec;

use crate::coordinates::{Direction, GridPosition, WorldPosition};
use crate::tiles::{TileAllocator, TileLayer};
use crate::units::{Height, ModuleIndex, StepsCount, Width};
use crate::utils::{self, TileSet};

/// Weights of the direction roll at the module centre: down, left, right.
pub const DIRECTION_WEIGHTS: [u32; 3] = [50, 25, 25];

/// Rolls allowed before a run of rejected repeats gives up and keeps the previous direction.
const MAX_DIRECTION_ROLLS: usize = 8;

/// Seed of a module, from its position normalised to the reference spacing.
pub fn module_seed(normalized: &WorldPosition) -> i64 {
    (normalized.x as f64 * 1000.0 + normalized.z as f64 * 10000.0).round() as i64
}

/// Seed of the private random stream of one path run.
pub fn walk_seed(base_seed: u64, normalized: &WorldPosition) -> u64 {
    base_seed.wrapping_add(module_seed(normalized) as u64)
}

/// When a module may spawn a branch off its main path.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum BranchPolicy {
    Never,
    /// On the first step after leaving the centre, to the left or right at even odds.
    AfterCentre,
    /// When the path turns at the centre and current, original and branch headings all differ.
    AtTurn,
}

impl BranchPolicy {
    pub fn for_module(index: ModuleIndex, branching_active: bool) -> BranchPolicy {
        if !branching_active {
            BranchPolicy::Never
        } else if index.is_first() {
            BranchPolicy::AfterCentre
        } else if index.is_multiple_of(3) {
            BranchPolicy::AtTurn
        } else {
            BranchPolicy::Never
        }
    }
}

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub struct Exit {
    pub tile: GridPosition,
    pub direction: Direction,
}

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum AbortReason {
    /// The walk came back to a tile it had already carved.
    Overlap(GridPosition),
    /// The walk ran out of steps before reaching a boundary.
    StepBudget,
}

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum WalkOutcome {
    Exited(Exit),
    Aborted(AbortReason),
}

/// A branch decided at spawn time: the straight line from where it leaves the main path to the
/// module boundary.
#[derive(Eq, PartialEq, Clone, Debug)]
pub struct BranchRoute {
    pub start: GridPosition,
    pub direction: Direction,
    pub tiles: Vec<GridPosition>,
    pub exit: Exit,
}

impl BranchRoute {
    /// Simulate straight line travel from `start` until the boundary in `direction`.
    pub fn trace(start: GridPosition,
                 direction: Direction,
                 width: Width,
                 height: Height)
                 -> BranchRoute {
        let mut tiles = vec![start];
        let mut current = start;
        while !current.is_exit_boundary(direction, width, height) {
            match current.offset(direction, width, height) {
                Some(next) => {
                    current = next;
                    tiles.push(next);
                }
                None => break,
            }
        }
        BranchRoute {
            start,
            direction,
            tiles,
            exit: Exit { tile: current, direction },
        }
    }
}

#[derive(Eq, PartialEq, Clone, Debug)]
pub enum StepResult {
    /// A tile was carved and the walk goes on.
    Continue,
    /// A tile was carved, a branch left the path here and the walk goes on.
    Spawned(BranchRoute),
    Finished(WalkOutcome),
}

/// Weighted direction choice with a limit on consecutive repeats and a history of the directions
/// used since the last reset.
#[derive(Debug, Clone)]
pub struct DirectionPicker {
    previous: Direction,
    repeating: bool,
    used: SmallVec<[Direction; 3]>,
    weights: WeightedIndex<u32>,
}

impl DirectionPicker {
    pub fn new(current: Direction) -> DirectionPicker {
        let mut used = SmallVec::new();
        used.push(current);
        DirectionPicker {
            previous: current,
            repeating: false,
            used,
            weights: WeightedIndex::new(&DIRECTION_WEIGHTS).expect("direction weights are valid"),
        }
    }

    fn roll<R: Rng>(&self, rng: &mut R) -> Direction {
        Direction::ALL[self.weights.sample(rng)]
    }

    /// Choose the next heading. `is_legal` says whether a heading can be walked from here.
    ///
    /// An illegal roll falls back to the first legal heading of down, left, right.
    /// Returns None if no heading is legal at all.
    pub fn pick<R, F>(&mut self, rng: &mut R, is_legal: F) -> Option<Direction>
        where R: Rng,
              F: Fn(Direction) -> bool
    {
        let mut rolled = self.previous;
        for _ in 0..MAX_DIRECTION_ROLLS {
            let candidate = self.roll(rng);
            if candidate == self.previous {
                if self.repeating {
                    continue;
                }
                self.repeating = true;
            } else {
                self.repeating = false;
            }
            rolled = candidate;
            break;
        }

        let chosen = if is_legal(rolled) {
            Some(rolled)
        } else {
            Direction::ALL.iter().cloned().find(|d| is_legal(*d))
        };

        if let Some(direction) = chosen {
            self.record(direction);
        }
        chosen
    }

    fn record(&mut self, direction: Direction) {
        self.previous = direction;
        if !self.used.contains(&direction) {
            self.used.push(direction);
        }
        if self.used.len() == Direction::ALL.len() {
            self.used.clear();
            self.used.push(direction);
        }
    }

    pub fn used(&self) -> &[Direction] {
        &self.used
    }
}

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
enum WalkKind {
    Main,
    Branch,
}

#[derive(Debug, Clone)]
pub struct PathWalker {
    kind: WalkKind,
    width: Width,
    height: Height,
    centre: GridPosition,
    position: GridPosition,
    direction: Direction,
    original_direction: Direction,
    picker: DirectionPicker,
    visited: TileSet,
    carved: Vec<GridPosition>,
    steps: usize,
    max_steps: usize,
    rng: XorShiftRng,
    branch_policy: BranchPolicy,
    branched: bool,
    previous_was_centre: bool,
    turned: bool,
    outcome: Option<WalkOutcome>,
}

impl PathWalker {
    /// The main path of a module, from its entry tile to a boundary.
    pub fn main_path(width: Width,
                     height: Height,
                     entry_tile: GridPosition,
                     entry_direction: Direction,
                     seed: u64,
                     branch_policy: BranchPolicy)
                     -> PathWalker {
        PathWalker {
            kind: WalkKind::Main,
            width,
            height,
            centre: GridPosition::centre(width, height),
            position: entry_tile,
            direction: entry_direction,
            original_direction: entry_direction,
            picker: DirectionPicker::new(entry_direction),
            visited: utils::fnv_hashset(width.0 + height.0),
            carved: Vec::with_capacity(width.0 + height.0),
            steps: 0,
            max_steps: width.0 + height.0,
            rng: utils::seeded_rng(seed),
            branch_policy,
            branched: false,
            previous_was_centre: false,
            turned: false,
            outcome: None,
        }
    }

    /// The carving walk of a branch: straight along its route, never turning or branching.
    pub fn branch(width: Width, height: Height, route: &BranchRoute, seed: u64) -> PathWalker {
        let mut walker = PathWalker::main_path(width,
                                               height,
                                               route.start,
                                               route.direction,
                                               seed,
                                               BranchPolicy::Never);
        walker.kind = WalkKind::Branch;
        walker
    }

    /// Tiles carved by this run, in carve order.
    pub fn carved(&self) -> &[GridPosition] {
        &self.carved
    }

    pub fn steps(&self) -> StepsCount {
        StepsCount(self.steps)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn original_direction(&self) -> Direction {
        self.original_direction
    }

    /// Did the path change heading at the centre?
    pub fn turned(&self) -> bool {
        self.turned
    }

    pub fn outcome(&self) -> Option<WalkOutcome> {
        self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    fn finish(&mut self, outcome: WalkOutcome) -> StepResult {
        match outcome {
            WalkOutcome::Exited(exit) => {
                log::trace!("walk exited {} at {:?} after {} steps",
                            exit.direction,
                            exit.tile,
                            self.steps)
            }
            WalkOutcome::Aborted(reason) => {
                log::warn!("walk aborted after {} steps: {:?}", self.steps, reason)
            }
        }
        self.outcome = Some(outcome);
        StepResult::Finished(outcome)
    }

    /// Carve the current tile and move on by one.
    pub fn step(&mut self, layer: &mut TileLayer, allocator: &mut dyn TileAllocator) -> StepResult {
        if let Some(outcome) = self.outcome {
            return StepResult::Finished(outcome);
        }
        if self.steps >= self.max_steps {
            return self.finish(WalkOutcome::Aborted(AbortReason::StepBudget));
        }

        let pos = self.position;
        if !self.visited.insert(pos) {
            return self.finish(WalkOutcome::Aborted(AbortReason::Overlap(pos)));
        }
        layer.clear(pos, allocator);
        self.carved.push(pos);
        log::trace!("carved {:?} heading {}", pos, self.direction);

        // The entry tile sits on a boundary for side entries, it never counts as the way out.
        let moved = self.steps > 0;
        if moved && pos.is_exit_boundary(self.direction, self.width, self.height) {
            let exit = Exit { tile: pos, direction: self.direction };
            return self.finish(WalkOutcome::Exited(exit));
        }

        let mut spawned = None;
        if self.kind == WalkKind::Main {
            if self.branch_policy == BranchPolicy::AfterCentre && !self.branched &&
               self.previous_was_centre {
                let side = if self.rng.gen() { Direction::Left } else { Direction::Right };
                spawned = Some(self.spawn_branch(pos, side));
            }

            if moved && pos == self.centre {
                self.choose_direction(pos);

                if self.branch_policy == BranchPolicy::AtTurn && !self.branched &&
                   self.direction.is_lateral() {
                    if let Some(side) = Direction::third(self.direction, self.original_direction) {
                        spawned = Some(self.spawn_branch(pos, side));
                    }
                }
            }
        }
        self.previous_was_centre = pos == self.centre;

        match pos.offset(self.direction, self.width, self.height) {
            Some(next) => {
                self.position = next;
                self.steps += 1;
            }
            None => {
                // Only reachable when a walk starts on its own exit edge
                let exit = Exit { tile: pos, direction: self.direction };
                return self.finish(WalkOutcome::Exited(exit));
            }
        }

        match spawned {
            Some(route) => StepResult::Spawned(route),
            None => StepResult::Continue,
        }
    }

    fn choose_direction(&mut self, pos: GridPosition) {
        let (width, height) = (self.width, self.height);
        let u_turn = self.original_direction.opposite();
        let is_legal = |d: Direction| Some(d) != u_turn && pos.offset(d, width, height).is_some();

        match self.picker.pick(&mut self.rng, is_legal) {
            Some(direction) => {
                if direction != self.direction {
                    log::trace!("turning {} -> {} at {:?}", self.direction, direction, pos);
                    self.turned = true;
                }
                self.direction = direction;
            }
            None => log::debug!("boxed in at {:?}, keeping heading {}", pos, self.direction),
        }
    }

    fn spawn_branch(&mut self, pos: GridPosition, side: Direction) -> BranchRoute {
        self.branched = true;
        let route = BranchRoute::trace(pos, side, self.width, self.height);
        log::debug!("branch {} from {:?} to {:?}", side, pos, route.exit.tile);
        route
    }

    /// Drive the walk to its end, collecting any branches it spawns.
    pub fn run_to_end(&mut self,
                      layer: &mut TileLayer,
                      allocator: &mut dyn TileAllocator)
                      -> (WalkOutcome, Vec<BranchRoute>) {
        let mut branches = Vec::new();
        loop {
            match self.step(layer, allocator) {
                StepResult::Continue => {}
                StepResult::Spawned(route) => branches.push(route),
                StepResult::Finished(outcome) => return (outcome, branches),
            }
        }
    }
}
