//! Curve and point-cloud processing for surface toolpaths.
//!
//! [`geom`] holds the engine: point filters, segment sequencing, surface
//! projection and raster generation. [`oracle`] provides surfaces to project
//! onto, and [`tools`] combines both into the operations a host exposes.
//!
//! The library logs through the `log` facade and never installs a logger.

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod geom;
pub mod oracle;
pub mod tools;

pub use geom::{Curve, CurvePoint, CurveSet, SurfaceOracle};
pub use tools::{CurveSettings, PatternSettings, ToolError};
