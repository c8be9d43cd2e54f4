mod core;
mod filter;
mod grid;
mod point;
mod projection;
mod sequence;
pub mod vector;

pub use core::{BBox, Point3, Tolerance, Transform, Vec3};
pub use filter::{
    DuplicateFilterOptions, FilterDiagnostics, StraightLineOptions, filter_duplicates,
    filter_straight_lines,
};
pub use grid::{GRID_NORMAL, GridError, GridOptions, MAX_GRID_POINTS, generate_grid};
pub use point::{
    Curve, CurvePoint, CurveSet, PointFormatError, curve_from_arrays, transform_curve,
};
pub use projection::{
    GridProjectionDiagnostics, GridProjectionOptions, ProjectionError, ProjectionKind,
    ProjectionMode, SurfaceOracle, offset_curve, project, project_grid, smooth_normals,
};
pub use sequence::{
    GreedyNearestNeighbor, NearestWalk, SegmentSequencer, WalkStep, closest_point_index,
    merge_curves, nearest_curve_point, rotate_start, sort_segments, split_discontinuous, split_with,
};

#[cfg(test)]
mod tests;
