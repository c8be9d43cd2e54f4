//! Host-facing curve and pattern tools.
//!
//! Each tool is a pure function over curves, an optional surface oracle and
//! an explicit settings value. Reading curves from and writing them back to
//! a host is left to the caller.

mod curves;
mod pattern;
mod settings;

pub use curves::{
    curve_to_targets, curves_from_arrays, move_start_point, project_curves, recalculate_normals,
    reorder_curves, simplify_curves, simplify_on_surface, split_curves,
};
pub use pattern::pattern_paths;
pub use settings::{CurveSettings, PatternSettings};

use crate::geom::{GridError, PointFormatError, ProjectionError};

/// Errors raised by the tools.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ToolError {
    #[error(transparent)]
    Point(#[from] PointFormatError),

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error("pattern grid: {0}")]
    Grid(#[from] GridError),
}
