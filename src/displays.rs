//! Plain text views of modules and whole mazes.

use std::fmt;

use itertools::Itertools;

use crate::builder::ModuleRecord;
use crate::coordinates::GridPosition;
use crate::generator::Maze;
use crate::tiles::TileLayer;
use crate::utils::TileSet;

pub const SOLID_CHAR: char = '#';
pub const PATH_CHAR: char = '.';
pub const BRANCH_CHAR: char = '+';
pub const CAVE_CHAR: char = '~';
pub const CLEAR_CHAR: char = ' ';

fn layer_rows<F>(layer: &TileLayer, tile_char: F) -> String
    where F: Fn(GridPosition) -> char
{
    (0..layer.height.0)
        .map(|z| {
            (0..layer.width.0)
                .map(|x| tile_char(GridPosition::new(x as u32, z as u32)))
                .collect::<String>()
        })
        .join("\n")
}

/// Solid tiles as `#`, carved ones blank. One text row per `z`.
impl fmt::Display for TileLayer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let rows = layer_rows(self, |pos| if self.is_solid(pos) { SOLID_CHAR } else { CLEAR_CHAR });
        writeln!(f, "{}", rows)
    }
}

/// Header line followed by the wall layer, with the path, branch and cave tiles told apart.
impl fmt::Display for ModuleRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match self.index {
            Some(index) => format!("module {}", index.0),
            None => String::from("blocker"),
        };
        let exit = self.exit_direction().map_or_else(|| String::from("-"), |d| d.to_string());
        writeln!(f,
                 "#{} {} at {} entering {} leaving {}",
                 self.id.0,
                 kind,
                 self.descriptor.position,
                 self.descriptor.entry_direction,
                 exit)?;

        let path: TileSet = self.path_tiles.iter().cloned().collect();
        let caves: TileSet = self.cave_tiles.iter().cloned().collect();
        let rows = layer_rows(&self.wall, |pos| {
            if self.wall.is_solid(pos) {
                SOLID_CHAR
            } else if path.contains(&pos) {
                PATH_CHAR
            } else if self.is_branch_tile(pos) {
                BRANCH_CHAR
            } else if caves.contains(&pos) {
                CAVE_CHAR
            } else {
                CLEAR_CHAR
            }
        });
        writeln!(f, "{}", rows)
    }
}

/// One line per module plus a closing line of totals.
#[derive(Debug)]
pub struct MazeOverview<'a> {
    maze: &'a Maze,
}

impl<'a> MazeOverview<'a> {
    pub fn new(maze: &'a Maze) -> MazeOverview<'a> {
        MazeOverview { maze }
    }
}

impl<'a> fmt::Display for MazeOverview<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f,
                 "{:>4} {:>7} {:>24} {:>6} {:>6} {:>5} {:>5} {:>5} {:>8}",
                 "id",
                 "index",
                 "position",
                 "entry",
                 "exit",
                 "path",
                 "steps",
                 "cave",
                 "branches")?;
        for m in self.maze.modules() {
            let index = m.index.map_or_else(|| String::from("blocker"), |i| i.0.to_string());
            let exit = m.exit_direction().map_or_else(|| String::from("-"), |d| d.to_string());
            writeln!(f,
                     "{:>4} {:>7} {:>24} {:>6} {:>6} {:>5} {:>5} {:>5} {:>8}",
                     m.id.0,
                     index,
                     m.descriptor.position.to_string(),
                     m.descriptor.entry_direction.to_string(),
                     exit,
                     m.path_tiles.len(),
                     m.steps.0,
                     m.cave_tiles.len(),
                     m.branches.len())?;
        }

        let s = self.maze.stats();
        writeln!(f,
                 "{} modules, {} blockers, {} branches, {} caves, {} rejected placements, {} \
                  aborted paths, {} left unbuilt",
                 s.modules_built,
                 s.blockers_built,
                 s.branches_spawned,
                 s.caves_carved,
                 s.rejected_placements,
                 s.overlap_aborts + s.step_budget_aborts,
                 s.unbuilt_descriptors)
    }
}
