use modular_mazes::{
    config::{CaveStyle, MapConfig},
    coordinates::Direction,
    generator::{self, Maze},
    placement::Lineage,
    walker::WalkOutcome,
};
use petgraph::graph::NodeIndex;
use quickcheck::quickcheck;
use std::collections::{HashMap, HashSet};

fn config_for(seed: u64, modules: u8, branching: bool, caves: bool) -> MapConfig {
    let mut config = MapConfig {
        seed,
        module_count: 1 + (modules % 14) as usize,
        branching: if branching { Some(0) } else { None },
        ..MapConfig::default()
    };
    config.voronoi.enabled = caves;
    config
}

fn path_shapes(maze: &Maze) -> Vec<Vec<(u32, u32)>> {
    maze.modules()
        .iter()
        .map(|m| m.path_tiles.iter().map(|t| (t.x, t.z)).collect())
        .collect()
}

#[test]
fn example_single_module_run() {
    let maze = generator::generate(MapConfig { module_count: 1, ..MapConfig::default() }).unwrap();
    let stats = maze.stats();
    assert_eq!((stats.modules_built, stats.blockers_built), (1, 1));
    let first = &maze.modules()[0];
    assert_eq!((first.path_tiles[0].x, first.path_tiles[0].z), (6, 6));
    assert_eq!(first.exit_direction(), Some(Direction::Down));
    assert!(maze.modules()[1].is_blocker());
}

#[test]
fn same_seed_same_maze() {
    fn prop(seed: u64, modules: u8, branching: bool, caves: bool) -> bool {
        let a = generator::generate(config_for(seed, modules, branching, caves)).unwrap();
        let b = generator::generate(config_for(seed, modules, branching, caves)).unwrap();
        path_shapes(&a) == path_shapes(&b) && a.placements() == b.placements() &&
        a.stats() == b.stats()
    }
    quickcheck(prop as fn(u64, u8, bool, bool) -> bool);
}

#[test]
fn path_shapes_ignore_spacing() {
    fn prop(seed: u64, modules: u8, branching: bool) -> bool {
        let reference = config_for(seed, modules, branching, false);
        let mut scaled = reference.clone();
        scaled.spacing = 2.5;
        scaled.module_spacing = 3.0;
        let a = generator::generate(reference).unwrap();
        let b = generator::generate(scaled).unwrap();
        path_shapes(&a) == path_shapes(&b)
    }
    quickcheck(prop as fn(u64, u8, bool) -> bool);
}

#[test]
fn built_modules_never_collide() {
    fn prop(seed: u64, modules: u8, branching: bool) -> bool {
        let maze = generator::generate(config_for(seed, modules, branching, false)).unwrap();
        let min_distance = maze.config().min_module_distance();
        let positions: Vec<_> = maze.modules().iter().map(|m| m.descriptor.position).collect();
        positions.iter().enumerate().all(|(i, a)| {
            positions[i + 1..].iter().all(|b| a.distance(b) >= min_distance)
        })
    }
    quickcheck(prop as fn(u64, u8, bool) -> bool);
}

#[test]
fn paths_never_revisit_and_exit_on_a_boundary() {
    fn prop(seed: u64, modules: u8, branching: bool) -> bool {
        let maze = generator::generate(config_for(seed, modules, branching, false)).unwrap();
        let (w, h) = (maze.config().grid_width(), maze.config().grid_height());
        let ok = maze.path_modules().all(|m| {
            let unique: HashSet<_> = m.path_tiles.iter().collect();
            let exits_ok = match m.outcome {
                Some(WalkOutcome::Exited(exit)) => {
                    m.path_tiles.last() == Some(&exit.tile) &&
                    exit.tile.is_exit_boundary(exit.direction, w, h)
                }
                _ => true,
            };
            unique.len() == m.path_tiles.len() && exits_ok
        });
        ok
    }
    quickcheck(prop as fn(u64, u8, bool) -> bool);
}

#[test]
fn budget_is_respected() {
    fn prop(seed: u64, modules: u8, branching: bool) -> bool {
        let config = config_for(seed, modules, branching, false);
        let budget = config.module_count;
        let maze = generator::generate(config).unwrap();
        let indexed = maze.path_modules().all(|m| m.index.map_or(false, |i| i.0 < budget));
        maze.stats().modules_built <= budget && indexed
    }
    quickcheck(prop as fn(u64, u8, bool) -> bool);
}

#[test]
fn caves_keep_paths_and_branches() {
    fn prop(seed: u64, modules: u8, branching: bool, voronoi: bool) -> bool {
        let mut config = config_for(seed, modules, branching, true);
        if voronoi {
            config.voronoi.style = CaveStyle::Voronoi;
        }
        let maze = generator::generate(config).unwrap();
        let ok = maze.modules().iter().all(|m| {
            let preserved = m.preserved_tiles();
            m.cave_tiles.iter().all(|t| !preserved.contains(t))
        });
        ok
    }
    quickcheck(prop as fn(u64, u8, bool, bool) -> bool);
}

#[test]
fn every_exit_is_followed_unless_refused_or_cut_off() {
    fn prop(seed: u64, modules: u8, branching: bool) -> bool {
        let maze = generator::generate(config_for(seed, modules, branching, false)).unwrap();
        let stats = maze.stats();
        if stats.rejected_placements > 0 || stats.unbuilt_descriptors > 0 {
            return true;
        }
        let graph = maze.graph();
        let ok = maze.path_modules().all(|m| match m.outcome {
            Some(WalkOutcome::Exited(exit)) => {
                graph.edges(NodeIndex::new(m.id.0)).any(|e| *e.weight() == exit.direction)
            }
            _ => true,
        });
        ok
    }
    quickcheck(prop as fn(u64, u8, bool) -> bool);
}

#[test]
fn each_exit_is_sealed_by_at_most_one_blocker() {
    fn prop(seed: u64, modules: u8, branching: bool) -> bool {
        let maze = generator::generate(config_for(seed, modules, branching, false)).unwrap();
        let mut seals: HashMap<(usize, Direction), usize> = HashMap::new();
        for blocker in maze.modules().iter().filter(|m| m.is_blocker()) {
            let parent = match blocker.descriptor.parent {
                Some(p) => p,
                None => return false,
            };
            *seals.entry((parent.0, blocker.descriptor.entry_direction)).or_insert(0) += 1;
        }
        if seals.values().any(|&n| n != 1) {
            return false;
        }

        // every sealed side is a real exit or branch of the parent
        let exits_of = |id: usize| -> Vec<Direction> {
            let m = &maze.modules()[id];
            let main = match m.outcome {
                Some(WalkOutcome::Exited(exit)) => Some(exit.direction),
                _ => None,
            };
            main.into_iter().chain(m.branches.iter().map(|b| b.exit.direction)).collect()
        };
        if !seals.keys().all(|&(parent, direction)| exits_of(parent).contains(&direction)) {
            return false;
        }

        // a clean run seals every main exit past the budget
        let stats = maze.stats();
        if stats.rejected_placements > 0 || stats.unbuilt_descriptors > 0 {
            return true;
        }
        let budget = maze.config().module_count;
        let ok = maze.path_modules().all(|m| match (m.index, m.outcome) {
            (Some(i), Some(WalkOutcome::Exited(exit))) if i.0 + 1 >= budget => {
                seals.contains_key(&(m.id.0, exit.direction))
            }
            _ => true,
        });
        ok
    }
    quickcheck(prop as fn(u64, u8, bool) -> bool);
}

#[test]
fn branch_chains_hang_off_their_spawning_module() {
    let mut config = MapConfig { module_count: 8, ..MapConfig::default() };
    config.branching = Some(0);
    let maze = generator::generate(config).unwrap();
    let first_branch = maze.modules()
        .iter()
        .find(|m| m.descriptor.lineage == Lineage::Branch)
        .expect("module 0 always spawns a branch");
    assert_eq!(first_branch.descriptor.parent.map(|p| p.0), Some(0));
    assert!(first_branch.descriptor.entry_direction.is_lateral());
    let graph = maze.graph();
    // every module but the first has exactly one parent
    assert_eq!(graph.edge_count() + 1, graph.node_count());
}
