//! Concrete [`SurfaceOracle`](crate::geom::SurfaceOracle) implementations.
//!
//! - [`PlaneOracle`]: an infinite plane.
//! - [`MeshOracle`]: an indexed triangle mesh behind a BVH.
//! - [`ArrayOracle`]: a host callback speaking flat point arrays.
//!
//! All of them return unprojectable points unchanged. Recalculated normals
//! are the surface's own normal, whichever side the point came from.

mod bvh;
mod host;
mod mesh;
mod plane;

pub use host::ArrayOracle;
pub use mesh::{MeshError, MeshOracle, TriangleMesh};
pub use plane::PlaneOracle;
