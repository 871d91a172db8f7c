#![deny(missing_docs)]
#![doc = "Depth-graded 1-D meshes and the finite-volume grid built on them."]

/// Graded edge generation.
pub mod edges;
/// Derived cell geometry.
pub mod grid;

pub use edges::{generate_mesh, raw_edges, MeshParams, MAX_EDGES};
pub use grid::Grid;
