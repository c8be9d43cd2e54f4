use crate::geom::{CurveSet, SurfaceOracle, Transform, generate_grid, offset_curve, project_grid};

use super::{PatternSettings, ToolError};

/// Generate a surface pattern: raster in `frame`, projected onto the oracle's
/// surface, with optional repeated layers.
///
/// `frame` is the pattern's reference frame expressed in the oracle's
/// coordinate system. The returned paths are in `frame` coordinates. Each
/// projected run is followed by its `repeat_times - 1` copies offset along
/// the normals by multiples of `repeat_offset`.
///
/// # Errors
/// Grid parameter errors and projection errors.
pub fn pattern_paths<O: SurfaceOracle + ?Sized>(
    frame: Transform,
    oracle: &O,
    settings: &PatternSettings,
) -> Result<CurveSet, ToolError> {
    let lines = generate_grid(
        settings.size_x,
        settings.size_y,
        settings.step_x,
        settings.step_y,
        settings.grid_options(),
    )?;
    let (runs, diagnostics) = project_grid(&lines, frame, oracle, settings.projection_options())?;

    let layers = settings.repeat_times.max(1) as usize;
    let mut paths = Vec::with_capacity(runs.len() * layers);
    for run in runs {
        let repeats: Vec<_> = (1..settings.repeat_times.max(1))
            .map(|rep| offset_curve(&run, settings.repeat_offset * f64::from(rep)))
            .collect();
        paths.push(run);
        paths.extend(repeats);
    }

    log::debug!(
        "pattern_paths: {} grid lines -> {} paths ({} points rejected)",
        lines.len(),
        paths.len(),
        diagnostics.rejected_points + diagnostics.unprojected_points
    );
    Ok(paths)
}
