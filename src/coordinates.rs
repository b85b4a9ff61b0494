use std::convert::From;
use std::fmt;

use crate::units::{Height, Width};

/// Travel direction of a path inside a module grid.
///
/// There is no `Up`, mazes only flow forward (increasing z) and sideways.
#[derive(Hash, Eq, PartialEq, Copy, Clone, Debug, Ord, PartialOrd)]
pub enum Direction {
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 3] = [Direction::Down, Direction::Left, Direction::Right];

    #[inline]
    pub fn is_lateral(&self) -> bool {
        *self != Direction::Down
    }

    /// The direction that would walk straight back over the previous tile, if any.
    #[inline]
    pub fn opposite(&self) -> Option<Direction> {
        match *self {
            Direction::Down => None,
            Direction::Left => Some(Direction::Right),
            Direction::Right => Some(Direction::Left),
        }
    }

    /// The one direction distinct from both `a` and `b`.
    /// None if `a` and `b` are the same direction (two candidates remain).
    pub fn third(a: Direction, b: Direction) -> Option<Direction> {
        if a == b {
            return None;
        }
        Direction::ALL.iter().cloned().find(|&d| d != a && d != b)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        };
        write!(f, "{}", name)
    }
}

/// A tile inside one module's grid. `x` runs across the module, `z` runs forward.
#[derive(Hash, Eq, PartialEq, Copy, Clone, Debug, Ord, PartialOrd)]
pub struct GridPosition {
    pub x: u32,
    pub z: u32,
}

impl GridPosition {
    pub fn new(x: u32, z: u32) -> GridPosition {
        GridPosition { x, z }
    }

    /// The single centre tile of a `width` * `height` grid.
    pub fn centre(width: Width, height: Height) -> GridPosition {
        GridPosition::new((width.0 / 2) as u32, (height.0 / 2) as u32)
    }

    #[inline]
    pub fn is_within(&self, width: Width, height: Height) -> bool {
        (self.x as usize) < width.0 && (self.z as usize) < height.0
    }

    /// Creates a new position offset 1 tile away in the given direction.
    /// Returns None if that position falls outside the grid.
    pub fn offset(&self, direction: Direction, width: Width, height: Height) -> Option<GridPosition> {
        let next = match direction {
            Direction::Down => GridPosition::new(self.x, self.z + 1),
            Direction::Left => {
                if self.x > 0 {
                    GridPosition::new(self.x - 1, self.z)
                } else {
                    return None;
                }
            }
            Direction::Right => GridPosition::new(self.x + 1, self.z),
        };
        if next.is_within(width, height) {
            Some(next)
        } else {
            None
        }
    }

    /// Is this the last tile before leaving the grid when travelling in `direction`?
    pub fn is_exit_boundary(&self, direction: Direction, width: Width, height: Height) -> bool {
        match direction {
            Direction::Down => self.z as usize == height.0 - 1,
            Direction::Left => self.x == 0,
            Direction::Right => self.x as usize == width.0 - 1,
        }
    }

    /// Is this tile on any of the three edges a path may leave through?
    pub fn is_on_boundary(&self, width: Width, height: Height) -> bool {
        self.z as usize == height.0 - 1 || self.x == 0 || self.x as usize == width.0 - 1
    }

    /// Translate an exit tile of one module into the entry tile of the adjacent module.
    pub fn next_module_entry(&self, exit_direction: Direction, width: Width) -> GridPosition {
        match exit_direction {
            Direction::Down => GridPosition::new(self.x, 0),
            Direction::Left => GridPosition::new((width.0 - 1) as u32, self.z),
            Direction::Right => GridPosition::new(0, self.z),
        }
    }

    /// Row major index into a grid of the given width.
    #[inline]
    pub fn to_index(&self, width: Width) -> usize {
        self.z as usize * width.0 + self.x as usize
    }

    #[inline]
    pub fn from_index(index: usize, width: Width) -> GridPosition {
        GridPosition::new((index % width.0) as u32, (index / width.0) as u32)
    }
}

impl From<(u32, u32)> for GridPosition {
    fn from(x_z_pair: (u32, u32)) -> GridPosition {
        GridPosition::new(x_z_pair.0, x_z_pair.1)
    }
}

/// World placement of a module origin. `y` is always 0 for modules, layers are offset separately.
#[derive(PartialEq, Copy, Clone, Debug, Default)]
pub struct WorldPosition {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl WorldPosition {
    pub const ORIGIN: WorldPosition = WorldPosition { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> WorldPosition {
        WorldPosition { x, y, z }
    }

    pub fn distance(&self, other: &WorldPosition) -> f32 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Move one module over in the world, `offset_x` across and `offset_z` forward.
    pub fn stepped(&self, direction: Direction, offset_x: f32, offset_z: f32) -> WorldPosition {
        match direction {
            Direction::Down => WorldPosition::new(self.x, self.y, self.z + offset_z),
            Direction::Left => WorldPosition::new(self.x - offset_x, self.y, self.z),
            Direction::Right => WorldPosition::new(self.x + offset_x, self.y, self.z),
        }
    }
}

impl fmt::Display for WorldPosition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}


#[cfg(test)]
mod tests {

    use super::*;

    const W: Width = Width(13);
    const H: Height = Height(13);

    #[test]
    fn centre_of_odd_grid() {
        assert_eq!(GridPosition::centre(W, H), GridPosition::new(6, 6));
        assert_eq!(GridPosition::centre(Width(4), Height(6)), GridPosition::new(2, 3));
    }

    #[test]
    fn offsets_stay_inside_grid() {
        let gp = |x, z| GridPosition::new(x, z);
        assert_eq!(gp(0, 0).offset(Direction::Left, W, H), None);
        assert_eq!(gp(12, 0).offset(Direction::Right, W, H), None);
        assert_eq!(gp(3, 12).offset(Direction::Down, W, H), None);
        assert_eq!(gp(3, 4).offset(Direction::Down, W, H), Some(gp(3, 5)));
        assert_eq!(gp(3, 4).offset(Direction::Left, W, H), Some(gp(2, 4)));
        assert_eq!(gp(3, 4).offset(Direction::Right, W, H), Some(gp(4, 4)));
    }

    #[test]
    fn third_direction() {
        assert_eq!(Direction::third(Direction::Down, Direction::Left), Some(Direction::Right));
        assert_eq!(Direction::third(Direction::Right, Direction::Down), Some(Direction::Left));
        assert_eq!(Direction::third(Direction::Left, Direction::Right), Some(Direction::Down));
        assert_eq!(Direction::third(Direction::Left, Direction::Left), None);
    }

    #[test]
    fn exit_to_entry_mapping() {
        let exit_down = GridPosition::new(6, 12);
        let exit_left = GridPosition::new(0, 6);
        let exit_right = GridPosition::new(12, 4);
        assert_eq!(exit_down.next_module_entry(Direction::Down, W), GridPosition::new(6, 0));
        assert_eq!(exit_left.next_module_entry(Direction::Left, W), GridPosition::new(12, 6));
        assert_eq!(exit_right.next_module_entry(Direction::Right, W), GridPosition::new(0, 4));
    }

    #[test]
    fn boundaries() {
        assert!(GridPosition::new(0, 5).is_on_boundary(W, H));
        assert!(GridPosition::new(12, 5).is_on_boundary(W, H));
        assert!(GridPosition::new(5, 12).is_on_boundary(W, H));
        // The entry row is not a way out
        assert!(!GridPosition::new(5, 0).is_on_boundary(W, H));

        assert!(GridPosition::new(0, 5).is_exit_boundary(Direction::Left, W, H));
        assert!(!GridPosition::new(0, 5).is_exit_boundary(Direction::Right, W, H));
    }

    #[test]
    fn index_conversion() {
        let p = GridPosition::new(4, 7);
        let i = p.to_index(W);
        assert_eq!(i, 7 * 13 + 4);
        assert_eq!(GridPosition::from_index(i, W), p);
    }

    #[test]
    fn world_steps() {
        let o = WorldPosition::ORIGIN;
        assert_eq!(o.stepped(Direction::Down, 15.6, 15.6), WorldPosition::new(0.0, 0.0, 15.6));
        assert_eq!(o.stepped(Direction::Left, 15.6, 15.6), WorldPosition::new(-15.6, 0.0, 0.0));
        assert_eq!(o.stepped(Direction::Right, 15.6, 15.6), WorldPosition::new(15.6, 0.0, 0.0));
        assert!((o.distance(&WorldPosition::new(3.0, 0.0, 4.0)) - 5.0).abs() < 1e-6);
    }
}
