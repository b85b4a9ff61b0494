//! Generation settings. Everything the core reads but does not own.

use serde_derive::Deserialize;

use crate::coordinates::WorldPosition;
use crate::errors::*;
use crate::units::{Height, Width};

/// Spacing the per module seeds are normalised to, so path shapes do not depend on the
/// configured tile spacing.
pub const REFERENCE_SPACING: f32 = 1.2;

/// Modules closer than this fraction of the smallest module offset are considered colliding.
pub const MIN_DISTANCE_FACTOR: f32 = 0.8;

/// Size of the solid-free core of a square cave.
pub const CAVE_HOLLOW_SIZE: u32 = 1;

#[derive(Eq, PartialEq, Copy, Clone, Debug, Deserialize)]
pub enum CaveStyle {
    /// Solid square ring around the module centre, the style the path walker carves by default.
    Square,
    /// Jittered Voronoi cells of mixed circle/square/cross shapes.
    Voronoi,
}

#[derive(PartialEq, Clone, Debug, Deserialize)]
#[serde(default)]
pub struct VoronoiConfig {
    pub enabled: bool,
    pub style: CaveStyle,
    pub seed_count: usize,
    pub threshold: f32,
    pub variation: f32,
    pub circle_weight: f32,
    pub square_weight: f32,
    pub cross_weight: f32,
    /// Width of a cross arm as a fraction of the cell threshold.
    pub cross_arm_width: f32,
}

impl Default for VoronoiConfig {
    fn default() -> VoronoiConfig {
        VoronoiConfig {
            enabled: false,
            style: CaveStyle::Square,
            seed_count: 6,
            threshold: 3.0,
            variation: 0.25,
            circle_weight: 1.0,
            square_weight: 1.0,
            cross_weight: 1.0,
            cross_arm_width: 0.35,
        }
    }
}

impl VoronoiConfig {
    /// Parse `circle,square,cross` shape weights, e.g. `2,1,0.5`.
    pub fn parse_shape_weights(text: &str) -> Result<(f32, f32, f32)> {
        let bad_weights = || -> Error {
            ErrorKind::InvalidConfig(format!("cave weights '{}' are not three numbers like 1,1,1",
                                             text))
                .into()
        };
        let weights = text.split(',')
            .map(|w| w.trim().parse::<f32>().map_err(|_| bad_weights()))
            .collect::<Result<Vec<f32>>>()?;
        match *weights.as_slice() {
            [circle, square, cross] => Ok((circle, square, cross)),
            _ => Err(bad_weights()),
        }
    }
}

#[derive(PartialEq, Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub width: usize,
    pub height: usize,
    /// World distance between neighbouring tiles.
    pub spacing: f32,
    /// Extra world gap between neighbouring modules.
    pub module_spacing: f32,
    pub seed: u64,
    /// Budget of non-blocker modules.
    pub module_count: usize,
    /// Module index from which branches may spawn. None disables branching.
    pub branching: Option<usize>,
    pub voronoi: VoronoiConfig,
}

impl Default for MapConfig {
    fn default() -> MapConfig {
        MapConfig {
            width: 13,
            height: 13,
            spacing: REFERENCE_SPACING,
            module_spacing: 0.0,
            seed: 42,
            module_count: 10,
            branching: None,
            voronoi: VoronoiConfig::default(),
        }
    }
}

impl MapConfig {
    #[inline]
    pub fn grid_width(&self) -> Width {
        Width(self.width)
    }

    #[inline]
    pub fn grid_height(&self) -> Height {
        Height(self.height)
    }

    /// World distance between the origins of two modules, (across, forward).
    pub fn module_offsets(&self) -> (f32, f32) {
        (self.width as f32 * self.spacing + self.module_spacing,
         self.height as f32 * self.spacing + self.module_spacing)
    }

    fn reference_offsets(&self) -> (f32, f32) {
        (self.width as f32 * REFERENCE_SPACING, self.height as f32 * REFERENCE_SPACING)
    }

    /// Minimum distance allowed between two module origins.
    pub fn min_module_distance(&self) -> f32 {
        let (offset_x, offset_z) = self.module_offsets();
        offset_x.min(offset_z) * MIN_DISTANCE_FACTOR
    }

    /// Re-express a module position as if the reference spacing and no module gap were in use.
    ///
    /// Module origins always sit a whole number of offsets away from the first module, so counting
    /// the steps with the real offsets and replaying them with the reference offsets gives the same
    /// answer for any spacing.
    pub fn normalized_position(&self, position: &WorldPosition) -> WorldPosition {
        let (offset_x, offset_z) = self.module_offsets();
        let (ref_x, ref_z) = self.reference_offsets();
        if (offset_x - ref_x).abs() < 1e-4 && (offset_z - ref_z).abs() < 1e-4 {
            return *position;
        }
        let steps_x = (position.x / offset_x).round();
        let steps_z = (position.z / offset_z).round();
        WorldPosition::new(steps_x * ref_x, position.y, steps_z * ref_z)
    }

    /// Is the module with this index carrying a cave pass?
    pub fn is_cave_module(&self, index: usize) -> bool {
        self.voronoi.enabled && (index % 8 == 0 || index % 10 == 0)
    }

    /// Is branching switched on for the module with this index?
    pub fn branching_active(&self, index: usize) -> bool {
        self.branching.map_or(false, |start| index >= start)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| -> Result<()> {
            Err(ErrorKind::InvalidConfig(reason.to_string()).into())
        };

        if self.width < 3 || self.height < 3 {
            return invalid("grid width and height must both be at least 3");
        }
        if !self.spacing.is_finite() || self.spacing <= 0.0 {
            return invalid("tile spacing must be a positive number");
        }
        if !self.module_spacing.is_finite() || self.module_spacing < 0.0 {
            return invalid("module spacing must not be negative");
        }
        if self.module_count == 0 {
            return invalid("module count must be at least 1");
        }

        let v = &self.voronoi;
        if v.enabled {
            let non_negative = |x: f32| x.is_finite() && x >= 0.0;
            if !non_negative(v.threshold) || !non_negative(v.variation) {
                return invalid("voronoi threshold and variation must be finite and not negative");
            }
            let weights = [v.circle_weight, v.square_weight, v.cross_weight];
            if !weights.iter().all(|w| non_negative(*w)) || weights.iter().all(|w| *w == 0.0) {
                return invalid("voronoi shape weights must be finite, non-negative and not all zero");
            }
            if !(v.cross_arm_width > 0.0 && v.cross_arm_width <= 1.0) {
                return invalid("voronoi cross arm width must be in (0, 1]");
            }
        }
        Ok(())
    }
}
