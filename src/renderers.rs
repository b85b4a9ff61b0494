//! Top-down image of a whole maze, every module drawn at its place in the module lattice.

use std::convert::TryFrom;
use std::path::Path;

use image::{ImageBuffer, Rgb, RgbImage};

use crate::builder::ModuleRecord;
use crate::coordinates::GridPosition;
use crate::errors::*;
use crate::generator::Maze;

const BACKGROUND: Rgb<u8> = Rgb([20, 20, 24]);
const SOLID: Rgb<u8> = Rgb([96, 96, 104]);
const BLOCKER: Rgb<u8> = Rgb([128, 48, 48]);
const PATH: Rgb<u8> = Rgb([240, 240, 240]);
const BRANCH: Rgb<u8> = Rgb([120, 180, 255]);
const CAVE: Rgb<u8> = Rgb([210, 180, 120]);
const CLEAR: Rgb<u8> = Rgb([180, 180, 180]);

/// Lattice step of a module relative to the first module, (across, forward).
fn lattice_step(maze: &Maze, module: &ModuleRecord) -> (i64, i64) {
    let (offset_x, offset_z) = maze.config().module_offsets();
    let p = module.descriptor.position;
    ((p.x / offset_x).round() as i64, (p.z / offset_z).round() as i64)
}

fn tile_colour(module: &ModuleRecord, pos: GridPosition) -> Rgb<u8> {
    if module.wall.is_solid(pos) {
        if module.is_blocker() { BLOCKER } else { SOLID }
    } else if module.path_tiles.contains(&pos) {
        PATH
    } else if module.is_branch_tile(pos) {
        BRANCH
    } else if module.cave_tiles.contains(&pos) {
        CAVE
    } else {
        CLEAR
    }
}

/// Pixel size of an image `tiles_across` by `tiles_along` tiles, if it fits in memory.
fn image_size(tiles_across: u64, tiles_along: u64, tile_pixels: u32) -> Option<(u32, u32)> {
    let width = tiles_across.checked_mul(u64::from(tile_pixels))?;
    let height = tiles_along.checked_mul(u64::from(tile_pixels))?;
    let width = u32::try_from(width).ok()?;
    let height = u32::try_from(height).ok()?;
    // three bytes per pixel in one buffer
    u64::from(width)
        .checked_mul(u64::from(height))?
        .checked_mul(3)
        .and_then(|bytes| usize::try_from(bytes).ok())
        .map(|_| (width, height))
}

/// Draw the wall layer of every module, `tile_pixels` square pixels per tile.
///
/// Fails when the image would not fit in a `u32` sized, addressable buffer.
pub fn overview_image(maze: &Maze, tile_pixels: u32) -> Result<RgbImage> {
    let tile_pixels = tile_pixels.max(1);
    let (width, height) = (maze.config().width as i64, maze.config().height as i64);
    let steps: Vec<(i64, i64)> = maze.modules().iter().map(|m| lattice_step(maze, m)).collect();

    let min_x = steps.iter().map(|s| s.0).min().unwrap_or(0);
    let max_x = steps.iter().map(|s| s.0).max().unwrap_or(0);
    let min_z = steps.iter().map(|s| s.1).min().unwrap_or(0);
    let max_z = steps.iter().map(|s| s.1).max().unwrap_or(0);

    let tiles_across = ((max_x - min_x + 1) * width) as u64;
    let tiles_along = ((max_z - min_z + 1) * height) as u64;
    let (image_width, image_height) = match image_size(tiles_across, tiles_along, tile_pixels) {
        Some(size) => size,
        None => {
            return Err(ErrorKind::ImageTooLarge(tiles_across, tiles_along, tile_pixels).into())
        }
    };
    let mut img: RgbImage = ImageBuffer::from_pixel(image_width, image_height, BACKGROUND);

    for (module, &(sx, sz)) in maze.modules().iter().zip(steps.iter()) {
        let origin_x = ((sx - min_x) * width) as u32;
        let origin_z = ((sz - min_z) * height) as u32;
        for z in 0..height as u32 {
            for x in 0..width as u32 {
                let colour = tile_colour(module, GridPosition::new(x, z));
                let px = (origin_x + x) * tile_pixels;
                let pz = (origin_z + z) * tile_pixels;
                for dz in 0..tile_pixels {
                    for dx in 0..tile_pixels {
                        img.put_pixel(px + dx, pz + dz, colour);
                    }
                }
            }
        }
    }
    Ok(img)
}

/// Save the overview as a PNG file.
pub fn render_overview_png(maze: &Maze, tile_pixels: u32, file_path: &Path) -> Result<()> {
    let img = overview_image(maze, tile_pixels)?;
    log::info!("writing {}x{} overview to {}", img.width(), img.height(), file_path.display());
    img.save(file_path)?;
    Ok(())
}
