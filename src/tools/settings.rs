//! Tool settings with the defaults of the curve and pattern apps.
//!
//! Both structs deserialize with `#[serde(default)]`, so a host can persist
//! only the fields a user changed.

use serde::{Deserialize, Serialize};

use crate::geom::{DuplicateFilterOptions, GridOptions, GridProjectionOptions, StraightLineOptions};

/// Settings for the curve tools (simplify, project, split, targets).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveSettings {
    /// Project points on the surface before simplifying.
    pub project_points: bool,
    /// Recalculate point normals from the surface before simplifying.
    pub recalculate_normals: bool,
    /// Project along the current point normal instead of to the closest point.
    pub project_along_normal: bool,
    /// Sort segments into a continuous travel order.
    pub sort: bool,
    /// Allow reversing segments while sorting.
    pub reverse: bool,
    /// Merge the sorted segments into a single curve.
    pub merge: bool,
    pub remove_duplicates: bool,
    /// Include normals when comparing points.
    pub compare_normals: bool,
    pub remove_straight_lines: bool,
    /// Point distance tolerance (mm).
    pub point_tolerance: f64,
    /// Point normal tolerance (rad).
    pub normal_tolerance: f64,
    /// Straight line tolerance (rad).
    pub straight_line_tolerance: f64,
    /// Gap above which curves are split into separate groups (mm).
    pub split_tolerance: f64,
    /// Flip point normals when building targets.
    pub invert_target_normal: bool,
}

impl Default for CurveSettings {
    fn default() -> Self {
        Self {
            project_points: false,
            recalculate_normals: false,
            project_along_normal: true,
            sort: true,
            reverse: true,
            merge: true,
            remove_duplicates: true,
            compare_normals: true,
            remove_straight_lines: true,
            point_tolerance: 0.002,
            normal_tolerance: 0.01,
            straight_line_tolerance: 0.02,
            split_tolerance: 50.0,
            invert_target_normal: true,
        }
    }
}

impl CurveSettings {
    #[must_use]
    pub fn duplicate_options(&self) -> DuplicateFilterOptions {
        DuplicateFilterOptions::new(self.point_tolerance)
            .compare_normals(self.compare_normals)
            .with_normal_tolerance(self.normal_tolerance)
    }

    #[must_use]
    pub fn straight_line_options(&self) -> StraightLineOptions {
        StraightLineOptions::new(self.straight_line_tolerance)
            .compare_normals(self.compare_normals)
            .with_normal_angle(self.normal_tolerance)
    }
}

/// Settings for the surface pattern tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternSettings {
    /// Pattern size along the frame X axis (mm).
    pub size_x: f64,
    /// Pattern size along the frame Y axis (mm).
    pub size_y: f64,
    pub step_x: f64,
    pub step_y: f64,
    /// Triangular taper (deg), zero for a rectangle.
    pub triangle_angle_deg: f64,
    pub cover_all: bool,
    pub even_distribution: bool,
    /// Connect all rows into one path.
    pub continuous: bool,
    /// Drop points that did not reach the surface.
    pub remove_unprojected: bool,
    /// Number of layers, the projected one included.
    pub repeat_times: u32,
    /// Offset between layers along the point normals (mm).
    pub repeat_offset: f64,
}

impl Default for PatternSettings {
    fn default() -> Self {
        Self {
            size_x: 500.0,
            size_y: 500.0,
            step_x: 20.0,
            step_y: 50.0,
            triangle_angle_deg: 0.0,
            cover_all: false,
            even_distribution: false,
            continuous: true,
            remove_unprojected: false,
            repeat_times: 1,
            repeat_offset: 2.0,
        }
    }
}

impl PatternSettings {
    #[must_use]
    pub fn grid_options(&self) -> GridOptions {
        GridOptions::new()
            .cover_all(self.cover_all)
            .even_distribution(self.even_distribution)
            .continuous(self.continuous)
            .with_triangle_angle(self.triangle_angle_deg)
    }

    #[must_use]
    pub fn projection_options(&self) -> GridProjectionOptions {
        GridProjectionOptions::new().remove_unprojected(self.remove_unprojected)
    }
}
