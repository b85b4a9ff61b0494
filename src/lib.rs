//! **modular_mazes** grows a maze out of square tile modules.
//!
//! Each module is a grid of solid tiles with one path carved from its entry tile to a boundary.
//! Wherever a path leaves a module the next module is placed, until the module budget is spent
//! and the remaining exits are sealed with solid blocker modules. Some modules spawn side
//! branches, some get a cave carved around their path.

#![recursion_limit = "1024"]

pub mod builder;
pub mod carver;
pub mod collaborators;
pub mod config;
pub mod coordinates;
pub mod displays;
pub mod errors;
pub mod generator;
pub mod masks;
pub mod placement;
pub mod renderers;
pub mod tiles;
pub mod units;
pub mod utils;
pub mod walker;

pub use crate::config::MapConfig;
pub use crate::generator::{generate, MapOrchestrator, Maze};
